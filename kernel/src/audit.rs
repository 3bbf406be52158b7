//! `AuditRecord`: the immutable, per-event output of the decision kernel.

use serde::{Deserialize, Serialize};

/// Which branch of the decision tree produced `final_price_cents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    UsedHuman,
    UsedSupplierPlusBias,
    UsedHistoricPlusBias,
    FallbackNoData,
}

/// The three candidate prices the kernel considered for this event.
///
/// `supplier_cents`/`historic_cents` reflect *presence* in the price cache,
/// not freshness — an expired (stale) supplier entry still shows up here
/// even when it was not eligible for the decision itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputsSeen {
    pub historic_cents: Option<i64>,
    pub supplier_cents: Option<i64>,
    pub human_cents: Option<i64>,
}

/// One audit record per processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_id: String,
    pub timestamp: i64,
    pub item_id: String,
    pub inputs_seen: InputsSeen,
    pub final_price_cents: i64,
    pub decision: Decision,
    pub bias_applied_cents: i64,
    pub flags: Vec<String>,
    pub rules_hash: String,
}
