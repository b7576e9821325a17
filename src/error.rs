//! Error types for the pixeldrift library.
//!
//! A single fatal error type, [`PixelDriftError`], covers every operation.
//! Transformations are deterministic, so nothing here is retried and nothing
//! is downgraded to a partial success: one failing item in a batch fails the
//! whole batch, and the error names the item (file name or page) that caused it.
//!
//! The variants group into the five families callers care about:
//!
//! | Family         | Variants |
//! |----------------|----------|
//! | decode         | [`Decode`](PixelDriftError::Decode), [`CorruptPdf`](PixelDriftError::CorruptPdf) |
//! | validation     | [`Validation`](PixelDriftError::Validation) |
//! | page range     | [`InvalidPageRange`](PixelDriftError::InvalidPageRange), [`PageOutOfRange`](PixelDriftError::PageOutOfRange) |
//! | resource limit | [`ResourceLimit`](PixelDriftError::ResourceLimit) |
//! | encode         | [`Encode`](PixelDriftError::Encode), [`Archive`](PixelDriftError::Archive) |

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pixeldrift library.
#[derive(Debug, Error)]
pub enum PixelDriftError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The asset could not be decoded as a supported raster image.
    #[error("Unsupported or corrupted image '{item}': {detail}")]
    Decode { item: String, detail: String },

    /// The asset is not a readable PDF document.
    #[error("Invalid PDF '{item}': {detail}")]
    CorruptPdf { item: String, detail: String },

    /// The asset exceeds the configured maximum input size. Raised before
    /// any decode attempt.
    #[error("'{item}' is {size} bytes, which exceeds the {limit} byte input limit")]
    ResourceLimit {
        item: String,
        size: usize,
        limit: usize,
    },

    // ── Configuration errors ──────────────────────────────────────────────
    /// A request option is invalid (bad mode, non-positive dimension,
    /// margin too large, unsupported format, …).
    #[error("Invalid configuration: {0}")]
    Validation(String),

    // ── Page range errors ─────────────────────────────────────────────────
    /// A page-range token is malformed or reversed.
    #[error("Invalid page range token '{token}': {reason}")]
    InvalidPageRange { token: String, reason: String },

    /// A requested page does not exist in the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Processing errors ─────────────────────────────────────────────────
    /// The encoder rejected the image or configuration.
    #[error("Failed to encode '{item}': {detail}")]
    Encode { item: String, detail: String },

    /// pdfium returned an error for a specific page (1-indexed).
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Building the output archive failed.
    #[error("Failed to build archive: {0}")]
    Archive(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (worker panic, join failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PixelDriftError {
    /// True for page-range parse and bounds failures.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            PixelDriftError::InvalidPageRange { .. } | PixelDriftError::PageOutOfRange { .. }
        )
    }

    /// True for configuration failures.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, PixelDriftError::Validation(_))
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        PixelDriftError::Validation(msg.into())
    }
}

/// Alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PixelDriftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_out_of_range_names_page() {
        let e = PixelDriftError::PageOutOfRange { page: 11, total: 10 };
        let msg = e.to_string();
        assert!(msg.contains("Page 11"), "got: {msg}");
        assert!(msg.contains("10 pages"), "got: {msg}");
        assert!(e.is_range_error());
    }

    #[test]
    fn decode_error_names_item() {
        let e = PixelDriftError::Decode {
            item: "holiday.jpg".into(),
            detail: "bad marker".into(),
        };
        assert!(e.to_string().contains("holiday.jpg"));
        assert!(!e.is_range_error());
    }

    #[test]
    fn resource_limit_display() {
        let e = PixelDriftError::ResourceLimit {
            item: "scan.tiff".into(),
            size: 2048,
            limit: 1024,
        };
        let msg = e.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn validation_helper() {
        let e = PixelDriftError::validation("margin too large");
        assert!(e.is_validation_error());
        assert!(e.to_string().contains("margin too large"));
    }
}
