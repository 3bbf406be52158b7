//! Persistent state store: load/save `RulesState` with fingerprint
//! validation.
//!
//! Writes go through a temp-file-then-rename path so a crash mid-write
//! never leaves a half-written state file in place.

use std::path::Path;

use crate::codec::fingerprint;
use crate::state::RulesState;

/// Error loading or saving a [`RulesState`] file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {detail}")]
    Io { detail: String },

    #[error("state file is not valid JSON: {detail}")]
    Parse { detail: String },

    #[error("state file is corrupted: expected hash {expected}, found {found}")]
    Corruption { expected: String, found: String },
}

/// Load a [`RulesState`] from `path`.
///
/// If the file does not exist, returns a fresh empty state (`version = 1`,
/// no items) with `state_hash` set to the fingerprint of that empty state.
///
/// # Errors
///
/// Returns [`StoreError::Io`] on an I/O failure other than "not found",
/// [`StoreError::Parse`] if the file contents aren't valid JSON for
/// [`RulesState`], and [`StoreError::Corruption`] if a non-empty stored
/// `state_hash` disagrees with the recomputed fingerprint.
pub fn load(path: &Path) -> Result<RulesState, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut state = RulesState::default();
            state.state_hash = fingerprint(&state);
            return Ok(state);
        }
        Err(e) => {
            return Err(StoreError::Io {
                detail: format!("read {}: {e}", path.display()),
            })
        }
    };

    let state: RulesState = serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
        detail: format!("{e}"),
    })?;

    let recomputed = fingerprint(&state);
    if !state.state_hash.is_empty() && state.state_hash != recomputed {
        return Err(StoreError::Corruption {
            expected: recomputed,
            found: state.state_hash,
        });
    }

    Ok(state)
}

/// Recompute `state.state_hash`, write `state` to `path` as pretty-printed,
/// sorted-key JSON, and return the fingerprint just written.
///
/// Creates missing parent directories. Writes via a temp file in the same
/// directory followed by a rename, so a crash mid-write never leaves a
/// half-written state file in place.
///
/// # Errors
///
/// Returns [`StoreError::Io`] on any I/O failure.
pub fn save(state: &mut RulesState, path: &Path) -> Result<String, StoreError> {
    state.state_hash = fingerprint(state);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                detail: format!("create_dir_all {}: {e}", parent.display()),
            })?;
        }
    }

    // Route through `serde_json::Value` rather than serializing the struct
    // directly: struct fields serialize in declaration order, but the
    // external interface requires sorted keys at *every* nesting level,
    // including the top level. `serde_json::Map` (no `preserve_order`
    // feature) is BTreeMap-backed, so converting to `Value` first and
    // pretty-printing that sorts every object in the tree.
    let value = serde_json::to_value(&*state).map_err(|e| StoreError::Io {
        detail: format!("serialize: {e}"),
    })?;
    let pretty = serde_json::to_vec_pretty(&value).map_err(|e| StoreError::Io {
        detail: format!("serialize: {e}"),
    })?;

    write_atomic(path, &pretty)?;

    Ok(state.state_hash.clone())
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = match dir {
        Some(dir) => dir.join(temp_name),
        None => Path::new(&temp_name).to_path_buf(),
    };

    std::fs::write(&temp_path, content).map_err(|e| StoreError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| StoreError::Io {
        detail: format!("rename {} -> {}: {e}", temp_path.display(), path.display()),
    })?;

    Ok(())
}
