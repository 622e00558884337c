//! Shared test utilities for the dasterix workspace.
//!
//! This crate provides common helpers for locating and loading grammar
//! fixtures and binary sample vectors shared across multiple crates.

use std::fs;
use std::path::PathBuf;

/// Returns the path to the workspace-level testdata directory.
///
/// This resolves the path relative to the workspace root, not the
/// individual crate.
pub fn testdata_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR points to the crate using this library,
    // so we need to find the workspace root by looking for testdata/
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let candidates = [
        manifest_dir.join("../testdata"),    // From test-utils itself
        manifest_dir.join("../../testdata"), // From sub-crates
        manifest_dir.join("testdata"),       // From workspace root
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
        }
    }

    // Fallback - return the most likely path
    manifest_dir.join("../testdata")
}

/// Returns the path to a fixture file.
///
/// # Arguments
///
/// * `category` - "valid", "invalid" or "config"
/// * `filename` - Name of the fixture (e.g. "cat048_minimal.xml")
pub fn fixture_path(category: &str, filename: &str) -> PathBuf {
    testdata_dir().join(category).join(filename)
}

/// Loads a text fixture from the testdata directory.
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn load_fixture(category: &str, filename: &str) -> String {
    let path = fixture_path(category, filename);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Decodes a whitespace-tolerant hex dump into bytes, for the binary
/// sample vectors quoted in the test suites.
///
/// # Panics
///
/// Panics on malformed hex input.
pub fn bytes_from_hex(dump: &str) -> Vec<u8> {
    let compact: String = dump.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).unwrap_or_else(|e| panic!("Bad hex dump {dump:?}: {e}"))
}
