//! Shared helpers for the pricing engine's lock tests.
//!
//! A `tests/support/mod.rs` file is not picked up by Cargo as its own test
//! binary (unlike `tests/*.rs`), so every test file that needs these helpers
//! pulls them in with `mod support;`.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolve the path to a sibling binary built elsewhere in this workspace.
///
/// Integration test binaries land at `target/<profile>/deps/<name>-<hash>`.
/// The binaries built from other workspace members land one directory up,
/// at `target/<profile>/<name>`.
pub fn binary_path(name: &str) -> PathBuf {
    let mut dir = std::env::current_exe().expect("current_exe");
    dir.pop(); // deps/
    dir.pop(); // <profile>/
    let mut path = dir.join(name);
    if cfg!(windows) {
        path.set_extension("exe");
    }
    assert!(
        path.exists(),
        "expected binary at {} — is the cli package built?",
        path.display()
    );
    path
}

/// Write `lines` (already-serialized JSON, one per line) to `dir/name`,
/// returning the path written.
pub fn write_events(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n") + "\n").expect("write events file");
    path
}

/// Run the `donizo-engine` binary with `args` in `work_dir`, clearing locale
/// and timezone noise from the environment and optionally overriding more.
///
/// Returns trimmed stdout. Panics (with stderr attached) on nonzero exit.
pub fn run_cli(work_dir: &Path, args: &[&str], env_overrides: &[(&str, &str)]) -> String {
    let bin = binary_path("donizo-engine");
    let mut cmd = Command::new(bin);
    cmd.args(args);
    cmd.current_dir(work_dir);
    cmd.env_remove("LANG");
    cmd.env_remove("LC_ALL");
    cmd.env_remove("TZ");
    cmd.env_remove("RUST_LOG");
    for (key, value) in env_overrides {
        cmd.env(key, value);
    }
    let output = cmd.output().expect("spawn donizo-engine");
    assert!(
        output.status.success(),
        "donizo-engine exited with {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
    String::from_utf8(output.stdout)
        .expect("utf8 stdout")
        .trim()
        .to_string()
}
