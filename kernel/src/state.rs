//! Persistent and process-lifetime state: `RulesState`, `ItemState`, and the
//! per-item price cache.
//!
//! `RulesState` is the only part of this module written to disk (via
//! [`crate::store`]). `ItemPriceCache` is rebuilt from scratch on every run
//! and must never be serialized alongside it — see [`crate::codec`]'s
//! contract for why.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum number of accepted-human deltas retained per item (Rule C).
pub const MAX_DELTA_HISTORY: usize = 5;

/// The persisted learned state for a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    pub bias_cents: i64,
    pub last_updated_ts: i64,
    pub accepted_human_deltas_cents: Vec<i64>,
}

impl ItemState {
    /// Append `delta`, trim to the last [`MAX_DELTA_HISTORY`] entries
    /// (oldest-first order preserved), and recompute `bias_cents` as the
    /// integer-truncated median.
    pub fn record_accepted_delta(&mut self, delta: i64, at_ts: i64) {
        self.accepted_human_deltas_cents.push(delta);
        let len = self.accepted_human_deltas_cents.len();
        if len > MAX_DELTA_HISTORY {
            self.accepted_human_deltas_cents.drain(..len - MAX_DELTA_HISTORY);
        }
        self.bias_cents = median_truncated(&self.accepted_human_deltas_cents);
        self.last_updated_ts = at_ts;
    }
}

/// Integer-truncated median (truncate toward zero on the even-count average).
///
/// Distinct from [`crate::engine::floor_div2`], which floors toward negative
/// infinity. See spec design notes: these two rounding modes must never be
/// conflated.
#[must_use]
pub fn median_truncated(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        let sum = sorted[n / 2 - 1] + sorted[n / 2];
        sum / 2 // truncates toward zero, matching Rust's native integer division
    }
}

/// The persistent root state: schema version, per-item learned state, and
/// the last-computed fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesState {
    pub version: u32,
    pub items: BTreeMap<String, ItemState>,
    pub state_hash: String,
}

impl Default for RulesState {
    fn default() -> Self {
        Self {
            version: 1,
            items: BTreeMap::new(),
            state_hash: String::new(),
        }
    }
}

/// A single cached price observation: the value and when it was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceEntry {
    pub price_cents: i64,
    pub timestamp: i64,
}

/// The latest supplier/historic observations for one item. Not persisted —
/// rebuilt from the event stream on every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemPriceCache {
    pub supplier: Option<PriceEntry>,
    pub historic: Option<PriceEntry>,
}
