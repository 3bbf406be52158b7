//! Structural lock: exactly one canonical-JSON implementation must exist in
//! the kernel. Every hashed surface (state fingerprint, audit log lines)
//! must route through it — a second ad hoc serializer would be a silent
//! way for two code paths to disagree on byte-for-byte canonical form.

use std::path::Path;

fn kernel_src_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../kernel/src")
}

fn rust_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            rust_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

#[test]
fn one_canonical_json_implementation() {
    let mut files = Vec::new();
    rust_files(&kernel_src_dir(), &mut files);

    let hits: Vec<_> = files
        .iter()
        .filter(|path| {
            let text = std::fs::read_to_string(path).unwrap();
            text.contains("fn canonical_json_bytes") || text.contains("fn canonicalize_json")
        })
        .collect();

    assert_eq!(
        hits.len(),
        1,
        "expected exactly one canonical JSON implementation, found {hits:?}"
    );
    assert!(
        hits[0].ends_with("codec.rs"),
        "canonical JSON implementation should live in codec.rs, found {:?}",
        hits[0]
    );
}

#[test]
fn fingerprint_is_the_only_public_hashing_entry_point() {
    let mut files = Vec::new();
    rust_files(&kernel_src_dir(), &mut files);

    let hits: Vec<_> = files
        .iter()
        .filter(|path| {
            let text = std::fs::read_to_string(path).unwrap();
            text.contains("pub fn fingerprint")
        })
        .collect();

    assert_eq!(hits.len(), 1, "expected exactly one pub fn fingerprint, found {hits:?}");
}

#[test]
fn no_stale_package_name_references() {
    let mut files = Vec::new();
    rust_files(&kernel_src_dir(), &mut files);
    rust_files(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../runner/src"), &mut files);
    rust_files(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cli/src"), &mut files);

    for path in &files {
        let text = std::fs::read_to_string(path).unwrap();
        assert!(
            !text.contains("sterling_kernel") && !text.contains("sterling_search") && !text.contains("sterling_harness"),
            "{} still references a retired package name",
            path.display()
        );
    }
}
