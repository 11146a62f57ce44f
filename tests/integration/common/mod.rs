//! Shared fixtures for integration tests.

use std::io::Write;
use tempfile::NamedTempFile;

/// Path of a file under `fixtures/`.
pub fn fixture_path(name: &str) -> String {
    format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Write `contents` to a new temporary file.
pub fn temp_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

/// Generate `count` numbered lines, each terminated by `\n`.
pub fn generate_lines(count: usize) -> String {
    (0..count).map(|i| format!("record-{:05}\n", i)).collect()
}
