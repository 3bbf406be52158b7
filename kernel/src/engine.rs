//! The decision kernel: the stateful object that owns `RulesState` and the
//! price cache, and exposes the single `process()` entry point.
//!
//! Encodes the five rules in the order spec.md lays them out:
//!
//! ```text
//! validate -> update cache -> candidate eligibility (A) -> decay (D)
//!   -> circuit breaker (E) -> decision tree (B) [-> learning (C)]
//!   -> recompute fingerprint -> emit record
//! ```

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::audit::{AuditRecord, Decision, InputsSeen};
use crate::codec::fingerprint;
use crate::event::{Event, Outcome, Source};
use crate::state::{ItemPriceCache, ItemState, PriceEntry, RulesState};

/// How fresh a supplier quote must be, in seconds, to remain eligible.
pub const SUPPLIER_FRESHNESS_SECONDS: i64 = 3600;
/// Age, in seconds, beyond which the display bias is halved (Rule D).
pub const DECAY_THRESHOLD_SECONDS: i64 = 604_800;
/// The circuit breaker's ratio threshold, as a percentage (Rule E).
pub const CIRCUIT_BREAKER_RATIO: i64 = 150;

/// Fatal validation failure. Propagated to the caller; the run does not
/// continue past it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("duplicate event_id {event_id:?} (event #{ordinal})")]
    DuplicateEventId { event_id: String, ordinal: u64 },

    #[error("negative price_cents ({value}) in event {event_id:?}")]
    NegativePrice { event_id: String, value: i64 },

    #[error("non-HUMAN event {event_id:?} carries outcome {outcome:?} (must be NONE)")]
    OutcomeForNonHuman { event_id: String, outcome: Outcome },
}

/// Floor division by 2, rounding toward negative infinity.
///
/// Distinct from [`crate::state::median_truncated`], which truncates toward
/// zero. Rust's native `/` truncates toward zero, so negative decay values
/// need this explicit wrapper (−301 → −151, −300 → −150, 1 → 0).
#[must_use]
pub fn floor_div2(a: i64) -> i64 {
    if a >= 0 {
        a / 2
    } else {
        (a - 1) / 2
    }
}

/// The deterministic pricing decision-and-learning kernel.
///
/// Owns the persistent [`RulesState`], the process-lifetime price cache,
/// and the set of event ids seen so far. Call [`Kernel::process`] once per
/// event, in order.
pub struct Kernel {
    state: RulesState,
    cache: BTreeMap<String, ItemPriceCache>,
    seen_event_ids: HashSet<String>,
    event_count: u64,
}

impl Kernel {
    /// Build a kernel over an existing (possibly freshly-loaded) state.
    #[must_use]
    pub fn new(state: RulesState) -> Self {
        Self {
            state,
            cache: BTreeMap::new(),
            seen_event_ids: HashSet::new(),
            event_count: 0,
        }
    }

    /// Consume the kernel, returning its final persistent state.
    #[must_use]
    pub fn into_state(self) -> RulesState {
        self.state
    }

    /// Borrow the current persistent state (e.g. to snapshot between runs).
    #[must_use]
    pub fn state(&self) -> &RulesState {
        &self.state
    }

    /// Process one event, returning its audit record.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError`] on a duplicate event id, a negative price, or
    /// a non-HUMAN event carrying a non-`NONE` outcome. Validation runs
    /// entirely before any mutation, so a rejected event leaves the kernel's
    /// state untouched.
    pub fn process(&mut self, event: &Event) -> Result<AuditRecord, KernelError> {
        self.event_count += 1;

        if self.seen_event_ids.contains(&event.event_id) {
            return Err(KernelError::DuplicateEventId {
                event_id: event.event_id.clone(),
                ordinal: self.event_count,
            });
        }
        if event.price_cents < 0 {
            return Err(KernelError::NegativePrice {
                event_id: event.event_id.clone(),
                value: event.price_cents,
            });
        }
        if event.source != Source::Human && event.outcome != Outcome::None {
            return Err(KernelError::OutcomeForNonHuman {
                event_id: event.event_id.clone(),
                outcome: event.outcome,
            });
        }
        self.seen_event_ids.insert(event.event_id.clone());

        let cache = self.cache.entry(event.item_id.clone()).or_default();
        match event.source {
            Source::Supplier => {
                cache.supplier = Some(PriceEntry {
                    price_cents: event.price_cents,
                    timestamp: event.timestamp,
                });
                debug!(item_id = %event.item_id, price = event.price_cents, ts = event.timestamp, "supplier cache updated");
            }
            Source::Historic => {
                cache.historic = Some(PriceEntry {
                    price_cents: event.price_cents,
                    timestamp: event.timestamp,
                });
                debug!(item_id = %event.item_id, price = event.price_cents, ts = event.timestamp, "historic cache updated");
            }
            Source::Human => {}
        }

        let inputs_seen = InputsSeen {
            historic_cents: cache.historic.map(|e| e.price_cents),
            supplier_cents: cache.supplier.map(|e| e.price_cents),
            human_cents: (event.source == Source::Human).then_some(event.price_cents),
        };

        let (supplier_eligible, supplier_price) = match cache.supplier {
            Some(entry) if event.timestamp - entry.timestamp <= SUPPLIER_FRESHNESS_SECONDS => {
                (true, entry.price_cents)
            }
            _ => (false, 0),
        };
        let (historic_eligible, historic_price) = match cache.historic {
            Some(entry) => (true, entry.price_cents),
            None => (false, 0),
        };
        let human_eligible = event.source == Source::Human;

        // Rule D: decay for display only. Never mutates persisted bias_cents.
        let mut bias_cents = match self.state.items.get(&event.item_id) {
            Some(item_state) => {
                let age = event.timestamp - item_state.last_updated_ts;
                if age > DECAY_THRESHOLD_SECONDS {
                    let decayed = floor_div2(item_state.bias_cents);
                    info!(item_id = %event.item_id, from = item_state.bias_cents, to = decayed, age, "decay applied");
                    decayed
                } else {
                    item_state.bias_cents
                }
            }
            None => 0,
        };

        // Rule E: circuit breaker. A supplier price of exactly 0 is treated
        // as if no supplier existed for this rule (and for learning) only —
        // candidate selection elsewhere still considers it eligible.
        let mut flags: Vec<String> = Vec::new();
        let anomaly = human_eligible
            && supplier_eligible
            && supplier_price > 0
            && event.price_cents * 100 > supplier_price * CIRCUIT_BREAKER_RATIO;
        if anomaly {
            flags.push("ANOMALY_REJECTED".to_string());
            warn!(
                item_id = %event.item_id,
                human = event.price_cents,
                supplier = supplier_price,
                "circuit breaker rejected anomalous human price"
            );
        }

        // Rule B: decision tree, with Rule C (learning) folded into the
        // accepted-human branch.
        let (final_price_cents, decision) = if human_eligible && !anomaly {
            match event.outcome {
                Outcome::QuoteAccepted => {
                    flags.push("HUMAN_OVERRIDE_ACCEPTED".to_string());
                    info!(item_id = %event.item_id, price = event.price_cents, "human override accepted");

                    if supplier_eligible && supplier_price > 0 {
                        let delta = event.price_cents - supplier_price;
                        let item_state = self
                            .state
                            .items
                            .entry(event.item_id.clone())
                            .or_insert_with(ItemState::default);
                        item_state.record_accepted_delta(delta, event.timestamp);
                        bias_cents = item_state.bias_cents;
                        info!(
                            item_id = %event.item_id,
                            delta,
                            bias = item_state.bias_cents,
                            deltas = ?item_state.accepted_human_deltas_cents,
                            "bias updated"
                        );
                    }

                    (event.price_cents, Decision::UsedHuman)
                }
                Outcome::QuoteRejected => {
                    flags.push("HUMAN_REJECTED".to_string());
                    let (price, decision) = fallback(
                        supplier_eligible,
                        supplier_price,
                        historic_eligible,
                        historic_price,
                        bias_cents,
                    );
                    info!(item_id = %event.item_id, ?decision, price, "human rejected, fell back");
                    (price, decision)
                }
                Outcome::None => fallback(
                    supplier_eligible,
                    supplier_price,
                    historic_eligible,
                    historic_price,
                    bias_cents,
                ),
            }
        } else {
            fallback(
                supplier_eligible,
                supplier_price,
                historic_eligible,
                historic_price,
                bias_cents,
            )
        };

        self.state.state_hash = fingerprint(&self.state);

        let record = AuditRecord {
            event_id: event.event_id.clone(),
            timestamp: event.timestamp,
            item_id: event.item_id.clone(),
            inputs_seen,
            final_price_cents,
            decision,
            bias_applied_cents: bias_cents,
            flags,
            rules_hash: self.state.state_hash.clone(),
        };

        debug!(
            ordinal = self.event_count,
            event_id = %event.event_id,
            ?decision,
            final_price_cents,
            bias_cents,
            "event processed"
        );

        Ok(record)
    }
}

/// Rule B's fallback function: supplier+bias, else historic+bias, else
/// `FALLBACK_NO_DATA` with a final price of 0.
fn fallback(
    supplier_eligible: bool,
    supplier_price: i64,
    historic_eligible: bool,
    historic_price: i64,
    bias_cents: i64,
) -> (i64, Decision) {
    if supplier_eligible {
        (supplier_price + bias_cents, Decision::UsedSupplierPlusBias)
    } else if historic_eligible {
        (historic_price + bias_cents, Decision::UsedHistoricPlusBias)
    } else {
        (0, Decision::FallbackNoData)
    }
}
