//! Error types for the pdf2jpg library.
//!
//! Failures split along the same line as the batch loop:
//!
//! * [`Pdf2JpgError`] and [`ConfigError`] are **fatal**: the run stops before
//!   any file is touched (bad settings, no PDFium engine).
//!
//! * [`JobError`] is **non-fatal**: one PDF could not be converted or marked.
//!   It is logged, recorded in [`crate::report::BatchReport`], and the loop
//!   moves on to the next file.
//!
//! [`RenderError`] and [`EncodeError`] are the failure contracts of the two
//! collaborators (renderer and encoder); they surface wrapped in a
//! [`JobError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2jpg library.
#[derive(Debug, Error)]
pub enum Pdf2JpgError {
    /// The settings file is missing a key or holds an unusable value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The input directory could not be listed.
    #[error("Failed to scan input directory '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),
}

/// Problems with the settings file. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings template '{path}': {source}")]
    TemplateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file '{path}' is not valid key = value text: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Settings file '{path}' is missing required key '{key}'")]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("Settings file '{path}': invalid value for '{key}': {detail}")]
    InvalidValue {
        path: PathBuf,
        key: &'static str,
        detail: String,
    },

    #[error("Input directory '{path}' does not exist or is not a directory")]
    InputDirMissing { path: PathBuf },

    #[error("Cannot create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// The settings key this error is about, when there is one.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            ConfigError::MissingKey { key, .. } | ConfigError::InvalidValue { key, .. } => {
                Some(*key)
            }
            _ => None,
        }
    }
}

/// Renderer failure: the PDF could not be rasterised.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PDF header/trailer/xref is corrupt, the file is encrypted, or unreadable.
    #[error("cannot open PDF: {detail}")]
    Open { detail: String },

    /// The document opened but has no pages to render.
    #[error("PDF has no pages")]
    NoPages,

    /// pdfium-render returned an error for a specific page.
    #[error("rasterisation failed for page {page}: {detail}")]
    Page { page: usize, detail: String },

    /// The page bitmap would be too large to allocate or to store as JPEG.
    #[error(
        "page {page} would render at {width}x{height} px, over the limit of \
         {max_pixels} pixels ({max_side} px per side); lower the dpi",
        max_pixels = crate::pipeline::render::MAX_PAGE_PIXELS,
        max_side = crate::pipeline::render::MAX_PAGE_SIDE
    )]
    PageTooLarge { page: usize, width: u64, height: u64 },
}

/// Encoder failure: a page image could not be turned into JPEG bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JPEG quality must be 1–100, got {0}")]
    InvalidQuality(u8),

    #[error("cannot encode an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error("JPEG encoding failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// A non-fatal error for a single PDF.
///
/// The source file is left unmarked in every case. Only
/// [`JobError::MarkFailed`] leaves pages behind.
#[derive(Debug, Error)]
pub enum JobError {
    /// A marked file with the same stem exists, so converting would overwrite
    /// the pages of that earlier conversion.
    #[error("already converted as '{marked}'; remove or rename it to convert this file again")]
    AlreadyConverted { marked: PathBuf },

    /// Another PDF in this run writes pages under the same names
    /// (`a.pdf` and `a.PDF`).
    #[error("output names collide with '{other}', handled earlier in this run")]
    OutputConflict { other: PathBuf },

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("page {page}: {source}")]
    Encode {
        page: usize,
        #[source]
        source: EncodeError,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pages were written but the source could not be renamed; the next run
    /// will convert it again.
    #[error("converted, but failed to rename '{from}' to '{to}': {source}")]
    MarkFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_the_key() {
        let e = ConfigError::MissingKey {
            path: PathBuf::from("settings.toml"),
            key: "quality",
        };
        assert!(e.to_string().contains("'quality'"), "got: {e}");
        assert_eq!(e.key(), Some("quality"));
    }

    #[test]
    fn config_error_is_transparent_inside_fatal_error() {
        let e: Pdf2JpgError = ConfigError::InputDirMissing {
            path: PathBuf::from("/nope"),
        }
        .into();
        assert!(e.to_string().starts_with("Input directory '/nope'"));
    }

    #[test]
    fn encode_error_reports_page() {
        let e = JobError::Encode {
            page: 3,
            source: EncodeError::InvalidQuality(0),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("got 0"), "got: {msg}");
    }

    #[test]
    fn mark_failed_mentions_both_paths() {
        let e = JobError::MarkFailed {
            from: PathBuf::from("a.pdf"),
            to: PathBuf::from("a_processed.pdf"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = e.to_string();
        assert!(msg.contains("a.pdf") && msg.contains("a_processed.pdf"));
    }

    #[test]
    fn oversized_page_suggests_lowering_dpi() {
        let e = RenderError::PageTooLarge {
            page: 2,
            width: 10200,
            height: 13200,
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2") && msg.contains("10200x13200"), "got: {msg}");
        assert!(msg.contains("100000000 pixels"), "got: {msg}");
        assert!(msg.contains("lower the dpi"), "got: {msg}");
    }
}
