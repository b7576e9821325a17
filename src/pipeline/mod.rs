//! Pipeline stages for image and PDF processing.
//!
//! Each submodule implements one step and is synchronous; the public
//! operations in [`crate::convert`] run them on the blocking pool.
//!
//! ## Data Flow
//!
//! ```text
//! images:  decode ──▶ transform / layout ──▶ encode ──▶ package
//! pdf:     render ──▶ rasterize ──▶ document ──▶ bytes
//!          structure (page copy, info) ─────────▶ bytes
//! ```
//!
//! 1. [`decode`]: bytes → [`decode::RasterImage`] with EXIF/ICC metadata
//! 2. [`geometry`] / [`transform`]: target-size policy, resampling, sharpen
//! 3. [`params`] / [`encode`]: caller options → encoder settings → bytes
//! 4. [`layout`] / [`document`]: image → page placement, lopdf assembly
//! 5. [`render`] / [`rasterize`]: pdfium page bitmaps → JPEG pages
//! 6. [`range`] / [`structure`]: page expressions, structural page copy

pub mod decode;
pub mod document;
pub mod encode;
pub mod geometry;
pub mod layout;
pub mod params;
pub mod range;
pub mod rasterize;
pub mod render;
pub mod structure;
pub mod transform;
