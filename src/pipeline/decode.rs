//! Decoding: asset bytes → [`RasterImage`], plus EXIF orientation
//! normalisation.
//!
//! Decoding never rotates pixels. [`normalize_orientation`] is a separate
//! step so the order the engine guarantees is visible at the call site:
//!
//! ```text
//! decode ─▶ normalize_orientation ─▶ transform ─▶ strip metadata ─▶ encode
//! ```
//!
//! Auxiliary metadata is captured as opaque blobs: the EXIF TIFF structure
//! (via `kamadak-exif`) and the ICC profile (via the `image` decoder). Both
//! ride along on the [`RasterImage`] until the encode stage decides whether
//! to write them back.

use crate::asset::InputAsset;
use crate::error::{PixelDriftError, Result};
use exif::{In, Reader, Tag};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::{debug, warn};

// ── Types ────────────────────────────────────────────────────────────────

/// Colour layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::GrayscaleAlpha | ColorMode::Rgba)
    }
}

/// Auxiliary metadata carried alongside pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Raw EXIF TIFF structure (starts with `II*\0` or `MM\0*`).
    pub exif: Option<Vec<u8>>,
    pub icc_profile: Option<Vec<u8>>,
}

impl ImageMetadata {
    pub fn is_empty(&self) -> bool {
        self.exif.is_none() && self.icc_profile.is_none()
    }

    /// Drop everything.
    pub fn strip(&mut self) {
        self.exif = None;
        self.icc_profile = None;
    }

    /// EXIF orientation value (1–8), if an EXIF block with the tag is present.
    pub fn orientation(&self) -> Option<u32> {
        let raw = self.exif.as_ref()?;
        let exif = Reader::new().read_raw(raw.clone()).ok()?;
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    }
}

/// A decoded pixel buffer owned by exactly one operation.
///
/// Indexed (palette) sources are expanded to RGB/RGBA by the decoder, so the
/// buffer is always one of the [`ColorMode`] layouts.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub pixels: DynamicImage,
    pub metadata: ImageMetadata,
    pub source_format: Option<ImageFormat>,
}

impl RasterImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            metadata: ImageMetadata::default(),
            source_format: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn color_mode(&self) -> ColorMode {
        let c = self.pixels.color();
        match (c.has_color(), c.has_alpha()) {
            (false, false) => ColorMode::Grayscale,
            (false, true) => ColorMode::GrayscaleAlpha,
            (true, false) => ColorMode::Rgb,
            (true, true) => ColorMode::Rgba,
        }
    }

    /// Replace the pixels, keeping metadata.
    pub fn with_pixels(self, pixels: DynamicImage) -> Self {
        Self { pixels, ..self }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────

/// Decode `asset`, enforcing `max_bytes` before touching the decoder.
///
/// # Errors
/// - [`PixelDriftError::ResourceLimit`] when the asset is too large.
/// - [`PixelDriftError::Decode`] for unknown formats and corrupt data.
pub fn decode_image(asset: &InputAsset, max_bytes: usize) -> Result<RasterImage> {
    asset.check_size(max_bytes)?;

    let fail = |detail: String| PixelDriftError::Decode {
        item: asset.name.clone(),
        detail,
    };

    let reader = ImageReader::new(Cursor::new(asset.bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| fail(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| fail("unrecognised image format".into()))?;

    let mut decoder = reader.into_decoder().map_err(|e| fail(e.to_string()))?;
    let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
        warn!("{}: unreadable ICC profile ignored: {}", asset.name, e);
        None
    });
    let pixels = DynamicImage::from_decoder(decoder).map_err(|e| fail(e.to_string()))?;

    let exif = read_exif(&asset.bytes, format);
    debug!(
        "Decoded '{}' as {:?}: {}x{} px, exif={}, icc={}",
        asset.name,
        format,
        pixels.width(),
        pixels.height(),
        exif.is_some(),
        icc_profile.is_some()
    );

    Ok(RasterImage {
        pixels,
        metadata: ImageMetadata { exif, icc_profile },
        source_format: Some(format),
    })
}

/// Extract the EXIF TIFF structure from a container.
///
/// TIFF sources are skipped: their "EXIF block" is the whole file.
fn read_exif(bytes: &[u8], format: ImageFormat) -> Option<Vec<u8>> {
    if format == ImageFormat::Tiff {
        return None;
    }
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Some(exif.buf().to_vec()),
        Err(e) => {
            debug!("No EXIF block: {}", e);
            None
        }
    }
}

/// Orientation of a TIFF source, read by the `image` TIFF decoder from the
/// file's own IFD0.
fn tiff_orientation(bytes: &[u8]) -> Option<Orientation> {
    ImageReader::with_format(Cursor::new(bytes), ImageFormat::Tiff)
        .into_decoder()
        .ok()?
        .orientation()
        .ok()
}

// ── Orientation ──────────────────────────────────────────────────────────

/// Bake the EXIF orientation into the pixels and reset the tag to 1.
///
/// `source_bytes` is only consulted for TIFF sources, whose orientation
/// lives in the image's own header rather than a separate EXIF block.
pub fn normalize_orientation(mut image: RasterImage, source_bytes: &[u8]) -> RasterImage {
    let orientation = match image.source_format {
        Some(ImageFormat::Tiff) => tiff_orientation(source_bytes),
        // Clears the tag in place; the pixels are rotated below.
        _ => image
            .metadata
            .exif
            .as_mut()
            .and_then(|exif| Orientation::remove_from_exif_chunk(exif)),
    };
    let Some(orientation) = orientation.filter(|&o| o != Orientation::NoTransforms) else {
        return image;
    };

    debug!("Applying EXIF orientation {}", orientation.to_exif());
    image.pixels = apply_orientation(image.pixels, orientation.to_exif().into());
    image
}

/// Transform pixels so that orientation 1 displays them correctly.
///
/// Values outside 1–8 leave the image untouched.
pub fn apply_orientation(mut img: DynamicImage, orientation: u32) -> DynamicImage {
    if let Some(o) = u8::try_from(orientation).ok().and_then(Orientation::from_exif) {
        img.apply_orientation(o);
    }
    img
}
