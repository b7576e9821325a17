//! PDF rasterisation through pdfium.
//!
//! [`RasterSource`] is the read side of the document capability: page count,
//! page bitmaps at a zoom factor, and the information dictionary. The
//! rasterising compressor is written against the trait so it can be driven
//! by an in-memory fake in tests.
//!
//! `pdfium-render` wraps a C++ library that is not async-safe, so callers run
//! everything here inside `tokio::task::spawn_blocking`. A [`PdfiumDocument`]
//! borrows both the bound library and the source bytes; both are released
//! when it goes out of scope, on success and on error alike.

use crate::error::{PixelDriftError, Result};
use crate::output::DocumentInfo;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Read side of the document capability.
pub trait RasterSource {
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) with `zoom` pixels per point.
    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage>;

    fn info(&self) -> DocumentInfo;
}

/// Bind the pdfium library.
///
/// Lookup order: `explicit`, then `PDFIUM_LIB_PATH`, then the system
/// library search path. A path may name the library file or the directory
/// holding it.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium> {
    let env_path = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from);
    let candidates: Vec<PathBuf> = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_path)
        .collect();

    let mut failures = Vec::new();
    for path in &candidates {
        let library = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(path)
        } else {
            path.clone()
        };
        match Pdfium::bind_to_library(&library) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", library.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => failures.push(format!("{}: {:?}", library.display(), e)),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(e) => {
            failures.push(format!("system library: {:?}", e));
            Err(PixelDriftError::PdfiumBindingFailed(failures.join("; ")))
        }
    }
}

/// A PDF opened in pdfium.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    item: String,
}

impl<'a> PdfiumDocument<'a> {
    /// Open `bytes` as a PDF. `item` names the document in errors.
    pub fn load(pdfium: &'a Pdfium, bytes: &'a [u8], item: &str) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PixelDriftError::CorruptPdf {
                item: item.to_string(),
                detail: format!("{:?}", e),
            })?;
        info!("PDF loaded: '{}', {} pages", item, document.pages().len());
        Ok(Self {
            document,
            item: item.to_string(),
        })
    }
}

impl RasterSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage> {
        let fail = |e: PdfiumError| PixelDriftError::RasterisationFailed {
            page: index + 1,
            detail: format!("{}: {:?}", self.item, e),
        };

        let page = self.document.pages().get(index as u16).map_err(fail)?;
        // Pages render opaque: no transparent backdrop.
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(zoom)
            .set_clear_color(PdfColor::WHITE);
        let bitmap = page.render_with_config(&config).map_err(fail)?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn info(&self) -> DocumentInfo {
        let metadata = self.document.metadata();
        let tag = |kind: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(kind).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        DocumentInfo {
            title: tag(PdfDocumentMetadataTagType::Title),
            author: tag(PdfDocumentMetadataTagType::Author),
            subject: tag(PdfDocumentMetadataTagType::Subject),
            keywords: tag(PdfDocumentMetadataTagType::Keywords),
            creator: tag(PdfDocumentMetadataTagType::Creator),
            producer: tag(PdfDocumentMetadataTagType::Producer),
            creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
            modification_date: tag(PdfDocumentMetadataTagType::ModificationDate),
            page_count: self.page_count(),
            pdf_version: format!("{:?}", self.document.version()),
        }
    }
}
