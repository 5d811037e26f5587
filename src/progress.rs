//! Progress-callback trait for per-file batch events.
//!
//! Attach an [`Arc<dyn BatchProgressCallback>`] with
//! [`crate::convert::Converter::with_progress`] to receive events as the
//! batch works through the input directory. The `pdf2jpg` binary uses this to
//! drive its progress bar; library users can forward events anywhere else.
//! Logging happens independently through `tracing`.
//!
//! # Example
//!
//! ```rust
//! use pdf2jpg::BatchProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl BatchProgressCallback for FailureCounter {
//!     fn on_file_error(&self, _index: usize, _total: usize, path: &Path, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} failed: {}", path.display(), error);
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch loop as it processes each candidate file.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the scan, before the first file is converted.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is rendered.
    fn on_file_start(&self, index: usize, total_files: usize, path: &Path) {
        let _ = (index, total_files, path);
    }

    /// Called after every page of a file was written and the source renamed.
    fn on_file_complete(&self, index: usize, total_files: usize, path: &Path, pages: usize) {
        let _ = (index, total_files, path, pages);
    }

    /// Called when a file could not be converted or marked.
    fn on_file_error(&self, index: usize, total_files: usize, path: &Path, error: &str) {
        let _ = (index, total_files, path, error);
    }

    /// Called once after every candidate has been attempted.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// The default when no callback is attached.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Shared handle stored by [`crate::convert::Converter`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
