//! Pipeline stages for PDF-to-JPEG conversion.
//!
//! Each submodule implements exactly one step of converting a single file;
//! [`crate::convert`] strings them together for a whole directory.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ write ──▶ input::mark_processed
//! (scan)    (pdfium)   (jpeg)     (atomic)  (rename)
//! ```
//!
//! 1. [`input`]  — list candidate PDFs and apply the `_processed` marker
//! 2. [`render`] — rasterise pages one at a time at the configured DPI
//! 3. [`encode`] — flatten to RGB and JPEG-encode at the configured quality
//! 4. [`write`]  — temp-file-then-rename writes into the output directory

pub mod encode;
pub mod input;
pub mod render;
pub mod write;
