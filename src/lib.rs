//! # pixeldrift
//!
//! Resize, convert and compress images, lay images out as PDF pages, and
//! recompress, split, merge or inspect PDFs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes ─┬─ decode + EXIF orientation
//!              ├─ resize / pad / cover / sharpen
//!              ├─ encode (JPEG, PNG, WebP, BMP, TIFF)
//!              └─ one file, or a deterministic zip for batches
//!
//! PDF bytes ───┬─ render pages via pdfium ─▶ JPEG pages ─▶ new PDF
//!              └─ structural page copy (split / merge) via lopdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixeldrift::{resize_images, EngineConfig, InputAsset, OutputFormat, TransformSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let asset = InputAsset::new("cat.png", std::fs::read("cat.png")?);
//!     let spec = TransformSpec::builder()
//!         .width(800)
//!         .format(OutputFormat::Webp)
//!         .build()?;
//!     let out = resize_images(vec![asset], &spec, &EngineConfig::default()).await?;
//!     out.write_to("out").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pixeldrift` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! `compress_pdf` needs the pdfium shared library at runtime; see
//! [`EngineConfig::pdfium_library_path`] and `PDFIUM_LIB_PATH`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod asset;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use asset::InputAsset;
pub use config::{
    Background, CompressSpec, ConvertSpec, EngineConfig, EngineConfigBuilder, FitMode,
    Orientation, OutputFormat, PageLayoutSpec, PageSize, RasterCompressSpec, ResizeMode,
    TransformSpec,
};
pub use convert::{
    compress_image, compress_pdf, convert_images, extract_pages, images_to_pdf, inspect_pdf,
    merge_pdfs, resize_batch, resize_images,
};
pub use error::{PixelDriftError, Result};
pub use output::{BatchResult, DocumentInfo, OutputArtifact};
pub use package::package;
pub use pipeline::geometry::SizeRequest;
pub use pipeline::range::parse_pages;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
