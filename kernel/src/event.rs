//! `Event`: the immutable, externally-produced input to the kernel.
//!
//! Mirrors the wire format in `events.jsonl` one line at a time. Parsing
//! happens through serde; the structural invariants that cannot be expressed
//! in the type alone (non-empty ids, `outcome = NONE` for non-HUMAN sources)
//! are enforced by [`Event::validate`], called once by the kernel before any
//! state mutation.

use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

/// Where a price observation originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Historic,
    Supplier,
    Human,
}

/// The resolution of a human quote, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[default]
    None,
    QuoteAccepted,
    QuoteRejected,
}

/// A single price event from the input stream.
///
/// Invariant (enforced by [`Event::validate`], not by construction): if
/// `source != Source::Human` then `outcome == Outcome::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: i64,
    pub item_id: String,
    pub source: Source,
    pub price_cents: i64,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Why an otherwise-parseable `Event` failed structural validation.
///
/// Distinct from the kernel's own [`crate::engine::KernelError`] validation
/// failures (duplicate id, negative price, outcome mismatch) — this covers
/// only malformed shape, the kind of thing JSON deserialization can't catch
/// on its own (e.g. an empty `event_id`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventShapeError {
    #[error("event_id must not be empty")]
    EmptyEventId,
    #[error("item_id must not be empty")]
    EmptyItemId,
}

impl Event {
    /// Check the shape invariants that the type system doesn't enforce.
    ///
    /// # Errors
    ///
    /// Returns [`EventShapeError`] if `event_id` or `item_id` is empty.
    pub fn validate_shape(&self) -> Result<(), EventShapeError> {
        if self.event_id.is_empty() {
            return Err(EventShapeError::EmptyEventId);
        }
        if self.item_id.is_empty() {
            return Err(EventShapeError::EmptyItemId);
        }
        Ok(())
    }
}
