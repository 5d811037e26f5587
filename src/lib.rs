//! # pdf2jpg
//!
//! Batch-convert a directory of PDF documents into JPEG page images.
//!
//! A settings file names the input and output directories, the rendering DPI
//! and the JPEG quality. Every PDF in the input directory is rasterised with
//! PDFium, each page is saved as `<name>_page<N>.jpg`, and the source is
//! renamed to `<name>_processed.pdf` so later runs skip it. A file that fails
//! is logged and left alone for the next run; the rest of the batch carries on.
//!
//! ## Pipeline Overview
//!
//! ```text
//! settings.toml
//!  │
//!  ├─ 1. Config   load (or create a template and stop)
//!  ├─ 2. Scan     list *.pdf not yet marked _processed
//!  └─ per file    (refused if its page names are already taken)
//!      ├─ per page
//!      │   ├─ 3. Render  rasterise via pdfium at dpi / 72 scale
//!      │   ├─ 4. Encode  RGB → JPEG at the configured quality
//!      │   └─ 5. Write   temp file + rename into output_dir
//!      └─ 6. Mark    rename source to *_processed.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2jpg::{convert_directory, load_or_create, SettingsOutcome};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = match load_or_create(Path::new("settings.toml"))? {
//!         SettingsOutcome::Loaded(settings) => settings,
//!         SettingsOutcome::Created(path) => {
//!             eprintln!("fill in {} and run again", path.display());
//!             return Ok(());
//!         }
//!     };
//!     let report = convert_directory(&settings)?;
//!     eprintln!("{} converted, {} failed", report.converted.len(), report.failed.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2jpg` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{load_or_create, Settings, SettingsOutcome, DEFAULT_SETTINGS_FILE};
pub use convert::{convert_directory, Converter};
pub use error::{ConfigError, EncodeError, JobError, Pdf2JpgError, RenderError};
pub use pipeline::encode::{JpegPageEncoder, PageEncoder};
pub use pipeline::input::{list_candidates, Job, PROCESSED_SUFFIX};
pub use pipeline::render::{PageRenderer, PageSink, PdfiumRenderer, MAX_PAGE_PIXELS};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{BatchReport, FailedJob, FileConversion, JobOutcome};
