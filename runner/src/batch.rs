//! Batch runner: drives the kernel over a line-delimited event log and
//! produces a final state file plus an audit log.
//!
//! The runner uses ONLY kernel APIs: `store::load`, `store::save`,
//! `engine::Kernel::process`, `codec::fingerprint`. It does not implement
//! any decision logic itself.
//!
//! # Pipeline
//!
//! ```text
//! load state → for each non-blank line: parse event → kernel.process()
//!   → accumulate audit record → save state → write audit log → return hash
//! ```

use std::io::BufRead;
use std::path::Path;

use pricing_kernel::audit::AuditRecord;
use pricing_kernel::engine::{Kernel, KernelError};
use pricing_kernel::event::Event;
use pricing_kernel::state::RulesState;
use pricing_kernel::store::{self, StoreError};

use tracing::info;

/// Error during a batch run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("I/O error: {detail}")]
    Io { detail: String },

    #[error("invalid event on line {line_no}: {cause}")]
    InvalidEvent { line_no: usize, cause: String },

    #[error("kernel rejected event on line {line_no}: {source}")]
    Kernel { line_no: usize, source: KernelError },

    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}

/// Process all events in `events_path`, updating persisted state and
/// writing an audit log. Returns the final state fingerprint.
///
/// Loads whatever state already exists at `state_path` (or a fresh empty
/// state if absent) before processing.
///
/// # Errors
///
/// Returns [`RunnerError`] on any I/O failure, malformed event line, or
/// kernel rejection. The run stops at the first failure; no partial state
/// or audit log is written.
pub fn run(events_path: &Path, state_path: &Path, audit_path: &Path) -> Result<String, RunnerError> {
    info!(path = %state_path.display(), "loading state");
    let state = store::load(state_path)?;

    info!(path = %events_path.display(), "processing events");
    let (final_hash, record_count) = drive(state, events_path, state_path, audit_path)?;

    info!(path = %state_path.display(), hash = %final_hash, "state saved");
    info!(path = %audit_path.display(), records = record_count, "audit log saved");

    Ok(final_hash)
}

/// Run the engine from a fresh empty state and verify the resulting
/// fingerprint against the one recorded at `expected_hash_path`.
///
/// State and audit log are still written to `state_path`/`audit_path` for
/// inspection, regardless of whether the hashes match.
///
/// # Errors
///
/// Returns [`RunnerError`] on any I/O failure, malformed event line, or
/// kernel rejection.
pub fn replay(
    events_path: &Path,
    state_path: &Path,
    audit_path: &Path,
    expected_hash_path: &Path,
) -> Result<bool, RunnerError> {
    info!("replay mode: processing from clean state");

    let state = RulesState::default();
    let (final_hash, record_count) = drive(state, events_path, state_path, audit_path)?;
    info!(path = %audit_path.display(), records = record_count, "audit log saved");

    let expected_hash = std::fs::read_to_string(expected_hash_path)
        .map_err(|e| RunnerError::Io {
            detail: format!("read {}: {e}", expected_hash_path.display()),
        })?
        .trim()
        .to_string();

    let matched = final_hash == expected_hash;
    if matched {
        info!(hash = %final_hash, "replay PASSED");
    } else {
        tracing::error!(expected = %expected_hash, actual = %final_hash, "replay FAILED");
    }

    Ok(matched)
}

/// Shared event loop: build a kernel over `state`, process every non-blank
/// line of `events_path`, save the resulting state to `state_path`, write
/// the audit log to `audit_path`, and return `(final_hash, record_count)`.
fn drive(
    state: RulesState,
    events_path: &Path,
    state_path: &Path,
    audit_path: &Path,
) -> Result<(String, usize), RunnerError> {
    let mut kernel = Kernel::new(state);
    let mut records: Vec<AuditRecord> = Vec::new();

    let file = std::fs::File::open(events_path).map_err(|e| RunnerError::Io {
        detail: format!("open {}: {e}", events_path.display()),
    })?;
    let reader = std::io::BufReader::new(file);

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| RunnerError::Io {
            detail: format!("read {}: {e}", events_path.display()),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed).map_err(|e| RunnerError::InvalidEvent {
            line_no,
            cause: format!("{e}"),
        })?;
        event
            .validate_shape()
            .map_err(|e| RunnerError::InvalidEvent {
                line_no,
                cause: format!("{e}"),
            })?;

        let record = kernel
            .process(&event)
            .map_err(|source| RunnerError::Kernel { line_no, source })?;
        records.push(record);
    }

    let mut state = kernel.into_state();
    let final_hash = store::save(&mut state, state_path)?;
    write_audit_log(audit_path, &records)?;

    Ok((final_hash, records.len()))
}

/// Write one canonically-serialized `AuditRecord` per line, sorted keys,
/// no trailing whitespace beyond the line terminator.
fn write_audit_log(audit_path: &Path, records: &[AuditRecord]) -> Result<(), RunnerError> {
    if let Some(parent) = audit_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RunnerError::Io {
                detail: format!("create_dir_all {}: {e}", parent.display()),
            })?;
        }
    }

    let mut out = Vec::new();
    for record in records {
        let value = serde_json::to_value(record).map_err(|e| RunnerError::Io {
            detail: format!("serialize audit record: {e}"),
        })?;
        serde_json::to_writer(&mut out, &value).map_err(|e| RunnerError::Io {
            detail: format!("serialize audit record: {e}"),
        })?;
        out.push(b'\n');
    }

    std::fs::write(audit_path, &out).map_err(|e| RunnerError::Io {
        detail: format!("write {}: {e}", audit_path.display()),
    })?;

    Ok(())
}
