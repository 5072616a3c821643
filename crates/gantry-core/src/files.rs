//! Idempotent file helpers
//!
//! Steps that stage files compare content before writing so unchanged
//! output keeps its modification time and downstream caches stay warm.

use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `path` unless the file already holds exactly those
/// bytes. Returns whether a write happened.
pub fn write_if_changed(path: &Path, content: &[u8]) -> io::Result<bool> {
    if let Ok(existing) = fs::read(path) {
        if existing == content {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

/// Copy `src` to `dest` unless `dest` already holds identical bytes.
/// Returns whether a copy happened.
pub fn copy_if_changed(src: &Path, dest: &Path) -> io::Result<bool> {
    let source = fs::read(src)?;
    write_if_changed(dest, &source)
}
