//! Universal invariants and the replay-with-altered-hash scenario, exercised
//! through the batch runner rather than the kernel directly — these check
//! that nothing the runner does (line parsing, audit serialization, state
//! persistence) breaks what the kernel already guarantees.

mod support;

use pricing_kernel::audit::AuditRecord;
use pricing_kernel::state::RulesState;
use support::write_events;

#[test]
fn replay_rejects_a_single_altered_hex_digit() {
    let dir = tempfile::tempdir().unwrap();
    let events_path = write_events(
        dir.path(),
        "events.jsonl",
        &[
            r#"{"event_id":"s1","timestamp":0,"item_id":"x","source":"SUPPLIER","price_cents":1000}"#,
            r#"{"event_id":"h1","timestamp":10,"item_id":"x","source":"HUMAN","price_cents":1100,"outcome":"QUOTE_ACCEPTED"}"#,
        ],
    );

    let state_path = dir.path().join("state.json");
    let audit_path = dir.path().join("audit.jsonl");
    let hash = pricing_runner::batch::run(&events_path, &state_path, &audit_path).unwrap();

    let expected_path = dir.path().join("expected_hash.txt");
    std::fs::write(&expected_path, &hash).unwrap();
    let replay_state = dir.path().join("replay_state.json");
    let replay_audit = dir.path().join("replay_audit.jsonl");
    assert!(pricing_runner::batch::replay(&events_path, &replay_state, &replay_audit, &expected_path).unwrap());

    // Flip exactly one hex digit of the recorded hash.
    let mut altered = hash.clone().into_bytes();
    let flip_at = altered.len() - 1;
    altered[flip_at] = if altered[flip_at] == b'0' { b'1' } else { b'0' };
    let altered = String::from_utf8(altered).unwrap();
    assert_ne!(altered, hash);
    std::fs::write(&expected_path, &altered).unwrap();

    let replay_state_2 = dir.path().join("replay_state_2.json");
    let replay_audit_2 = dir.path().join("replay_audit_2.jsonl");
    let matched = pricing_runner::batch::replay(&events_path, &replay_state_2, &replay_audit_2, &expected_path).unwrap();
    assert!(!matched, "a single altered hex digit must fail replay verification");
}

#[test]
fn rolling_window_and_median_hold_over_a_longer_mixed_stream() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = Vec::new();
    let mut ts = 0i64;
    // Ten accepted-human cycles across two items, interleaved, each
    // preceded by a fresh supplier quote so learning fires every time.
    for k in 1..=10i64 {
        let item = if k % 2 == 0 { "paint-a" } else { "paint-b" };
        lines.push(format!(
            r#"{{"event_id":"s{k}","timestamp":{ts},"item_id":"{item}","source":"SUPPLIER","price_cents":2000}}"#
        ));
        ts += 5;
        lines.push(format!(
            r#"{{"event_id":"h{k}","timestamp":{ts},"item_id":"{item}","source":"HUMAN","price_cents":{},"outcome":"QUOTE_ACCEPTED"}}"#,
            2000 + 50 * k
        ));
        ts += 5;
    }
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let events_path = write_events(dir.path(), "events.jsonl", &line_refs);

    let state_path = dir.path().join("state.json");
    let audit_path = dir.path().join("audit.jsonl");
    pricing_runner::batch::run(&events_path, &state_path, &audit_path).unwrap();

    let state: RulesState = serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    for item in state.items.values() {
        assert!(
            item.accepted_human_deltas_cents.len() <= 5,
            "rolling window must never exceed 5 entries, got {:?}",
            item.accepted_human_deltas_cents
        );
        let expected_bias = pricing_kernel::state::median_truncated(&item.accepted_human_deltas_cents);
        assert_eq!(item.bias_cents, expected_bias);
    }

    let audit_text = std::fs::read_to_string(&audit_path).unwrap();
    for line in audit_text.lines() {
        let record: AuditRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.rules_hash.len(), 64);
        for flag in &record.flags {
            assert!(
                ["HUMAN_OVERRIDE_ACCEPTED", "HUMAN_REJECTED", "ANOMALY_REJECTED"].contains(&flag.as_str()),
                "unexpected flag {flag}"
            );
        }
    }
}

#[test]
fn non_human_events_never_produce_human_flags_over_a_mixed_stream() {
    let dir = tempfile::tempdir().unwrap();
    let events_path = write_events(
        dir.path(),
        "events.jsonl",
        &[
            r#"{"event_id":"s1","timestamp":0,"item_id":"x","source":"SUPPLIER","price_cents":1000}"#,
            r#"{"event_id":"hist1","timestamp":5,"item_id":"x","source":"HISTORIC","price_cents":900}"#,
            r#"{"event_id":"s2","timestamp":10,"item_id":"x","source":"SUPPLIER","price_cents":1050}"#,
            r#"{"event_id":"hist2","timestamp":15,"item_id":"x","source":"HISTORIC","price_cents":950}"#,
        ],
    );
    let state_path = dir.path().join("state.json");
    let audit_path = dir.path().join("audit.jsonl");
    pricing_runner::batch::run(&events_path, &state_path, &audit_path).unwrap();

    let audit_text = std::fs::read_to_string(&audit_path).unwrap();
    for line in audit_text.lines() {
        let record: AuditRecord = serde_json::from_str(line).unwrap();
        for flag in &record.flags {
            assert!(!["HUMAN_OVERRIDE_ACCEPTED", "HUMAN_REJECTED", "ANOMALY_REJECTED"].contains(&flag.as_str()));
        }
    }
}
