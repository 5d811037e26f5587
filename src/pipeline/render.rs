//! PDF rasterisation: render the pages of a PDF one at a time.
//!
//! The batch only depends on the [`PageRenderer`] trait. [`PdfiumRenderer`]
//! is the production implementation backed by `pdfium-render`; tests plug in
//! in-memory fakes so they run without a PDFium library.
//!
//! PDF user space is 72 points per inch, so rendering at a given DPI means
//! scaling each page by `dpi / 72`. A Letter page at 300 DPI comes out at
//! 2550 × 3300 px (about 34 MB as RGBA). Pages are handed to a sink as soon
//! as they are rasterised, so at most one page bitmap is alive at a time, and
//! a page larger than [`MAX_PAGE_PIXELS`] is refused before it is rendered.

use crate::error::{JobError, Pdf2JpgError, RenderError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Largest page bitmap the renderer will allocate, in pixels (~400 MB RGBA).
///
/// Letter at 1000 DPI (8500 × 11000) fits; Letter at 1200 DPI does not.
pub const MAX_PAGE_PIXELS: u64 = 100_000_000;

/// Largest width or height a baseline JPEG can carry.
pub const MAX_PAGE_SIDE: u64 = 65_535;

/// Receives each rendered page with its 1-based number.
pub type PageSink<'a> = dyn FnMut(usize, DynamicImage) -> Result<(), JobError> + 'a;

/// Renders a PDF page by page, in page order.
pub trait PageRenderer {
    /// Render every page of `pdf_path` at `dpi`, passing each image to `sink`
    /// before the next page is rasterised. Returns the number of pages.
    ///
    /// Stops at the first error, whether it comes from rendering or from
    /// `sink`.
    fn render_pages(
        &self,
        pdf_path: &Path,
        dpi: u32,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, JobError>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &R {
    fn render_pages(
        &self,
        pdf_path: &Path,
        dpi: u32,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, JobError> {
        (**self).render_pages(pdf_path, dpi, sink)
    }
}

/// Page scale factor for a target resolution.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// Pixel size of a `width_pt` × `height_pt` page rendered at `dpi`.
pub fn pixel_size(width_pt: f32, height_pt: f32, dpi: u32) -> (u64, u64) {
    let scale = f64::from(scale_for_dpi(dpi));
    let px = |pt: f32| (f64::from(pt) * scale).round().max(0.0) as u64;
    (px(width_pt), px(height_pt))
}

/// Refuse pages whose bitmap would exceed [`MAX_PAGE_PIXELS`] or [`MAX_PAGE_SIDE`].
pub fn check_page_size(page: usize, width: u64, height: u64) -> Result<(), RenderError> {
    if width > MAX_PAGE_SIDE || height > MAX_PAGE_SIDE || width * height > MAX_PAGE_PIXELS {
        return Err(RenderError::PageTooLarge {
            page,
            width,
            height,
        });
    }
    Ok(())
}

/// [`PageRenderer`] backed by a bound PDFium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Locate (downloading on first use) and bind the PDFium library.
    pub fn new() -> Result<Self, Pdf2JpgError> {
        let pdfium = pdfium_auto::bind_pdfium()
            .map_err(|e| Pdf2JpgError::PdfiumBindingFailed(e.to_string()))?;
        Ok(Self::from_pdfium(pdfium))
    }

    /// Wrap an already bound [`Pdfium`] instance.
    pub fn from_pdfium(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_pages(
        &self,
        pdf_path: &Path,
        dpi: u32,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, JobError> {
        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.to_lowercase().contains("password") {
                    RenderError::Open {
                        detail: "document is password protected".to_string(),
                    }
                } else {
                    RenderError::Open { detail }
                }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        if total_pages == 0 {
            return Err(RenderError::NoPages.into());
        }
        info!("PDF loaded: {} pages", total_pages);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));

        for (idx, page) in pages.iter().enumerate() {
            let number = idx + 1;
            let (width, height) = pixel_size(page.width().value, page.height().value, dpi);
            check_page_size(number, width, height)?;

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RenderError::Page {
                    page: number,
                    detail: format!("{:?}", e),
                })?;

            let image = bitmap.as_image();
            drop(bitmap);
            debug!(
                "Rendered page {} → {}x{} px",
                number,
                image.width(),
                image.height()
            );
            sink(number, image)?;
        }

        Ok(total_pages)
    }
}
