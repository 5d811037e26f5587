//! The batch loop: convert every candidate PDF in a directory.
//!
//! Files are handled one at a time, in the order the filesystem lists them.
//! For each file the renderer produces the pages one by one; each page is
//! JPEG-encoded and written atomically before the next is rasterised, and
//! finally the source is renamed with the processed marker.
//!
//! A file is refused up front, with nothing written, when its pages would
//! overwrite someone else's: an earlier conversion of the same stem is still
//! marked in the input directory, or another candidate in this run (`a.pdf`
//! next to `a.PDF`) already claimed the same output names. Anything that goes wrong for
//! one file is logged and recorded in the [`BatchReport`]; the loop always
//! moves on to the next file. Only problems that make the whole run
//! pointless (bad settings, unlistable input directory) are returned as
//! [`Pdf2JpgError`].

use crate::config::Settings;
use crate::error::{JobError, Pdf2JpgError, RenderError};
use crate::pipeline::encode::{JpegPageEncoder, PageEncoder};
use crate::pipeline::input::{self, Job};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::write;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::report::{BatchReport, FileConversion, JobOutcome};
use std::collections::hash_map::{Entry, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Convert every candidate in `settings.input_dir` using PDFium and the
/// default JPEG encoder.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(Pdf2JpgError)` only for fatal errors:
/// - PDFium cannot be located or bound
/// - `input_dir` is missing or cannot be listed, `output_dir` cannot be created
///
/// Per-file failures are reported in [`BatchReport::failed`].
pub fn convert_directory(settings: &Settings) -> Result<BatchReport, Pdf2JpgError> {
    let renderer = PdfiumRenderer::new()?;
    Converter::new(renderer).convert_directory(settings)
}

/// A renderer, an encoder and an optional progress callback.
///
/// ```rust,no_run
/// use pdf2jpg::{Converter, PdfiumRenderer, Settings};
/// # fn run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
/// let report = Converter::new(PdfiumRenderer::new()?).convert_directory(settings)?;
/// println!("{} converted, {} failed", report.converted.len(), report.failed.len());
/// # Ok(())
/// # }
/// ```
pub struct Converter<R, E = JpegPageEncoder> {
    renderer: R,
    encoder: E,
    progress: ProgressCallback,
}

impl<R: PageRenderer> Converter<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            encoder: JpegPageEncoder,
            progress: Arc::new(NoopProgressCallback),
        }
    }
}

impl<R: PageRenderer, E: PageEncoder> Converter<R, E> {
    /// Swap in a different page encoder.
    pub fn with_encoder<E2: PageEncoder>(self, encoder: E2) -> Converter<R, E2> {
        Converter {
            renderer: self.renderer,
            encoder,
            progress: self.progress,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Run the batch over `settings.input_dir`.
    pub fn convert_directory(&self, settings: &Settings) -> Result<BatchReport, Pdf2JpgError> {
        settings.prepare_dirs()?;

        let jobs = input::list_candidates(&settings.input_dir, settings.recursive).map_err(
            |source| Pdf2JpgError::ScanFailed {
                path: settings.input_dir.clone(),
                source,
            },
        )?;

        let total = jobs.len();
        info!("Found {} PDF files to convert", total);
        self.progress.on_batch_start(total);

        let start = Instant::now();
        let mut report = BatchReport {
            candidates: total,
            ..Default::default()
        };

        // Output stem → the first candidate that claimed it.
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

        for (i, job) in jobs.iter().enumerate() {
            let index = i + 1;
            info!("Starting conversion for: {}", job.path.display());
            self.progress.on_file_start(index, total, &job.path);

            let outcome = match claimed.entry(job.output_stem(&settings.output_dir)) {
                Entry::Occupied(owner) => Err(JobError::OutputConflict {
                    other: owner.get().clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(job.path.clone());
                    self.convert_file(job, settings)
                }
            };
            match &outcome {
                Ok(done) => {
                    info!(
                        pages = done.outputs.len(),
                        "Converted {} (renamed to {})",
                        job.path.display(),
                        done.marked_as.display()
                    );
                    self.progress
                        .on_file_complete(index, total, &job.path, done.outputs.len());
                }
                Err(e) => {
                    error!("Failed to convert {}: {}", job.path.display(), e);
                    self.progress
                        .on_file_error(index, total, &job.path, &e.to_string());
                }
            }
            report.record(job.path.clone(), outcome);
        }

        report.duration = start.elapsed();
        info!(
            "Conversion process completed. Successful: {}, Failed: {} ({}ms)",
            report.converted.len(),
            report.failed.len(),
            report.duration.as_millis()
        );
        self.progress.on_batch_complete(total, report.converted.len());

        Ok(report)
    }

    /// Convert one PDF: render, encode and write every page, then mark it.
    ///
    /// Refused without rendering when a marked file of the same stem already
    /// exists, since its pages would be overwritten. If any page fails, pages
    /// already written for this file are removed and the source keeps its
    /// name so the next run retries it. A failed rename after a successful
    /// conversion keeps the pages.
    pub fn convert_file(&self, job: &Job, settings: &Settings) -> JobOutcome {
        if let Some(marked) = input::existing_mark(&job.path) {
            return Err(JobError::AlreadyConverted { marked });
        }

        let out_dir = job.output_dir(&settings.output_dir);
        let mut written: Vec<PathBuf> = Vec::new();

        let rendered = self
            .renderer
            .render_pages(&job.path, settings.dpi, &mut |page, image| {
                if written.is_empty() {
                    std::fs::create_dir_all(&out_dir).map_err(|source| JobError::Write {
                        path: out_dir.clone(),
                        source,
                    })?;
                }

                let dest = job.page_output(&settings.output_dir, page);
                let bytes = self
                    .encoder
                    .encode(&image, settings.quality)
                    .map_err(|source| JobError::Encode { page, source })?;
                drop(image);

                write::write_atomic(&dest, &bytes).map_err(|source| JobError::Write {
                    path: dest.clone(),
                    source,
                })?;
                debug!(
                    "Page {} of {} saved as {}",
                    page,
                    job.path.display(),
                    dest.display()
                );
                written.push(dest);
                Ok(())
            });

        match rendered {
            Ok(_) if written.is_empty() => return Err(RenderError::NoPages.into()),
            Ok(_) => {}
            Err(e) => {
                write::discard_outputs(&written);
                return Err(e);
            }
        }

        let marked_as = input::mark_processed(&job.path).map_err(|source| JobError::MarkFailed {
            from: job.path.clone(),
            to: input::marked_path(&job.path),
            source,
        })?;

        Ok(FileConversion {
            source: job.path.clone(),
            marked_as,
            outputs: written,
        })
    }
}
