//! Canonical serialization and content hashing for `RulesState`.
//!
//! **Exactly one place** produces the bytes that feed `state_hash` in this
//! crate. All hashing flows — load-time validation, save-time recomputation,
//! per-event `rules_hash` — must route through [`fingerprint`].
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order), at every
//!    nesting level.
//! 2. No extraneous whitespace (compact separators).
//! 3. Strings are JSON-escaped per RFC 8259 §7.
//! 4. The encoding is always valid UTF-8.
//! 5. `state_hash` itself is excluded from the bytes that get hashed.

use std::io::Write;

use sha2::{Digest, Sha256};

use crate::state::RulesState;

/// Produce the canonical JSON bytes of a `serde_json::Value`.
///
/// Ported from the kernel's canonical-JSON discipline: sorted keys, compact
/// separators, no non-integer numbers ever reach this path (the state model
/// only ever carries integers, so unlike a general-purpose canonicalizer
/// this one never needs to reject floats).
fn canonical_json_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => buf.extend_from_slice(b"null"),
        serde_json::Value::Bool(b) => {
            buf.extend_from_slice(if *b { b"true" } else { b"false" });
        }
        serde_json::Value::Number(n) => {
            let _ = write!(buf, "{n}");
        }
        serde_json::Value::String(s) => write_string(buf, s),
        serde_json::Value::Array(arr) => {
            buf.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item);
            }
            buf.push(b']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, key);
                buf.push(b':');
                write_value(buf, &map[*key]);
            }
            buf.push(b'}');
        }
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut tmp = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

/// The canonical form of `state`, with `state_hash` removed, as a
/// `serde_json::Value` tree (sorted at serialization time by
/// [`canonical_json_bytes`]).
fn canonical_basis(state: &RulesState) -> serde_json::Value {
    let items: serde_json::Map<String, serde_json::Value> = state
        .items
        .iter()
        .map(|(id, item)| {
            let value = serde_json::json!({
                "bias_cents": item.bias_cents,
                "last_updated_ts": item.last_updated_ts,
                "accepted_human_deltas_cents": item.accepted_human_deltas_cents,
            });
            (id.clone(), value)
        })
        .collect();

    serde_json::json!({
        "version": state.version,
        "items": items,
    })
}

/// Compute the fingerprint of `state`: the lowercase hex SHA-256 of its
/// canonical serialization, excluding `state_hash`.
///
/// Invariant to map insertion order, to the current value of
/// `state.state_hash`, and to any pretty-printing whitespace used when the
/// state is written to disk.
#[must_use]
pub fn fingerprint(state: &RulesState) -> String {
    let basis = canonical_basis(state);
    let bytes = canonical_json_bytes(&basis);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}
