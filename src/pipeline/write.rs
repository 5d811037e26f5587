//! Atomic output writes.
//!
//! Each page is written to a temporary file in the destination directory and
//! renamed over the final name only once every byte is on disk, so a crash
//! or a full disk never leaves a truncated JPEG under a real page name.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// Write `bytes` to `dest` all-or-nothing.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Best-effort removal of pages already written for a job that later failed.
pub fn discard_outputs(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}
