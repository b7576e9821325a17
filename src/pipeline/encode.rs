//! Encoding: [`RasterImage`] + [`EncoderConfig`] → file bytes.
//!
//! The stage runs in three steps:
//!
//! 1. **Prepare pixels.** Formats without alpha get every transparent pixel
//!    composited over white. Bit depths the encoder cannot take are reduced
//!    to 8 bits per channel.
//! 2. **Encode.** JPEG goes through `jpeg-encoder`, which honours the
//!    config's chroma subsampling and optimised Huffman tables. Lossy WebP
//!    goes through libwebp via the `webp` crate. Everything else uses the
//!    `image` crate codec for the format.
//! 3. **Splice metadata.** When the config keeps metadata, EXIF and ICC are
//!    written back into the container: JPEG gets APP1/APP2 segments, PNG gets
//!    `eXIf`/`iCCP` chunks. The `image` encoders never emit these on their
//!    own, so an image with stripped metadata comes out clean.
//!
//! A WebP config without a quality falls back to the lossless `image`
//! encoder. BMP, TIFF and WebP carry no auxiliary metadata.

use crate::config::OutputFormat;
use crate::error::{PixelDriftError, Result};
use crate::pipeline::decode::{ImageMetadata, RasterImage};
use crate::pipeline::params::{
    build_encoder_config, ChromaSubsampling, CompressionEffort, EncoderConfig,
};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GrayImage, RgbImage};
use std::io::{Cursor, Write};
use tracing::debug;

/// JPEG APP1 payloads holding EXIF start with this marker.
const EXIF_APP1_HEADER: &[u8] = b"Exif\0\0";
/// JPEG APP2 payloads holding an ICC profile start with this marker.
const ICC_APP2_HEADER: &[u8] = b"ICC_PROFILE\0";
/// Largest ICC chunk that fits one APP2 segment after its 14-byte header.
const ICC_CHUNK_MAX: usize = 65_519;

/// Encode `image` according to `config`.
///
/// `item` names the asset in errors.
pub fn encode_image(image: &RasterImage, config: &EncoderConfig, item: &str) -> Result<Vec<u8>> {
    let pixels = prepare_pixels(&image.pixels, config);
    let fail = |e: image::ImageError| PixelDriftError::Encode {
        item: item.to_string(),
        detail: e.to_string(),
    };

    let mut buf = Vec::new();
    match config.format {
        OutputFormat::Jpeg => encode_jpeg_pixels(&pixels, config, &mut buf, item)?,
        OutputFormat::Png => {
            let compression = match config.compression_effort {
                CompressionEffort::Maximum => CompressionType::Best,
                CompressionEffort::Default => CompressionType::Default,
            };
            pixels
                .write_with_encoder(PngEncoder::new_with_quality(
                    &mut buf,
                    compression,
                    FilterType::Adaptive,
                ))
                .map_err(fail)?;
        }
        OutputFormat::Webp => match config.quality {
            Some(q) => {
                let encoder =
                    webp::Encoder::from_image(&pixels).map_err(|e| PixelDriftError::Encode {
                        item: item.to_string(),
                        detail: format!("WebP: {e}"),
                    })?;
                buf = encoder.encode(q as f32).to_vec();
            }
            None => pixels
                .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
                .map_err(fail)?,
        },
        OutputFormat::Bmp => {
            pixels
                .write_with_encoder(BmpEncoder::new(&mut buf))
                .map_err(fail)?;
        }
        OutputFormat::Tiff => {
            let mut cursor = Cursor::new(&mut buf);
            pixels
                .write_with_encoder(TiffEncoder::new(&mut cursor))
                .map_err(fail)?;
        }
    }

    if config.keep_metadata && !image.metadata.is_empty() {
        buf = match config.format {
            OutputFormat::Jpeg => splice_jpeg_metadata(&buf, &image.metadata),
            OutputFormat::Png => splice_png_metadata(&buf, &image.metadata).map_err(|e| {
                PixelDriftError::Encode {
                    item: item.to_string(),
                    detail: format!("writing PNG metadata: {e}"),
                }
            })?,
            other => {
                debug!("{} output carries no metadata; dropped for '{}'", other, item);
                buf
            }
        };
    }

    debug!(
        "Encoded '{}' → {} ({} bytes)",
        item,
        config.format,
        buf.len()
    );
    Ok(buf)
}

/// Encode opaque pixels straight to JPEG, without metadata.
///
/// Used for document pages, which never carry per-image metadata. Goes
/// through the same parameter mapping as every other JPEG output.
pub fn encode_jpeg(pixels: &DynamicImage, quality: u8, item: &str) -> Result<Vec<u8>> {
    let config = build_encoder_config(OutputFormat::Jpeg, quality, false)?;
    encode_image(&RasterImage::new(pixels.clone()), &config, item)
}

/// `pixels` must already be Luma8 or Rgb8 (see [`prepare_pixels`]).
fn encode_jpeg_pixels(
    pixels: &DynamicImage,
    config: &EncoderConfig,
    buf: &mut Vec<u8>,
    item: &str,
) -> Result<()> {
    let fail = |detail: String| PixelDriftError::Encode {
        item: item.to_string(),
        detail,
    };
    let (Ok(width), Ok(height)) = (
        u16::try_from(pixels.width()),
        u16::try_from(pixels.height()),
    ) else {
        return Err(fail(format!(
            "{}x{} exceeds the JPEG limit of 65535 per side",
            pixels.width(),
            pixels.height()
        )));
    };

    let mut encoder = jpeg_encoder::Encoder::new(buf, config.quality.unwrap_or(85));
    if let Some(ChromaSubsampling::Yuv420) = config.chroma_subsampling {
        encoder.set_sampling_factor(jpeg_encoder::SamplingFactor::R_4_2_0);
    }
    encoder.set_optimized_huffman_tables(config.optimize);

    let result = match pixels {
        DynamicImage::ImageLuma8(gray) => {
            encoder.encode(gray.as_raw(), width, height, jpeg_encoder::ColorType::Luma)
        }
        other => {
            let rgb = other.to_rgb8();
            encoder.encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        }
    };
    result.map_err(|e| fail(e.to_string()))
}

// ── Pixel preparation ────────────────────────────────────────────────────

fn prepare_pixels(img: &DynamicImage, config: &EncoderConfig) -> DynamicImage {
    let color = img.color();
    let gray = !color.has_color();

    if config.flatten_alpha && color.has_alpha() {
        let flat = flatten_onto(img, [255, 255, 255]);
        return if gray {
            DynamicImage::ImageLuma8(flat.to_luma8())
        } else {
            flat
        };
    }

    match config.format {
        // 8-bit only encoders.
        OutputFormat::Jpeg | OutputFormat::Bmp => {
            if gray {
                DynamicImage::ImageLuma8(img.to_luma8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
        OutputFormat::Webp => {
            if color.has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
        OutputFormat::Png | OutputFormat::Tiff => match img {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            _ => img.clone(),
        },
    }
}

/// Composite `img` over an opaque `background`, producing RGB8.
pub fn flatten_onto(img: &DynamicImage, background: [u8; 3]) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as u32;
        for c in 0..3 {
            let blended = (src[c] as u32 * a + background[c] as u32 * (255 - a) + 127) / 255;
            dst[c] = blended as u8;
        }
    }
    DynamicImage::ImageRgb8(out)
}

/// Single-channel copy, for grayscale output.
pub fn desaturate(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

// ── JPEG metadata ────────────────────────────────────────────────────────

/// Insert APP1 (EXIF) and APP2 (ICC) segments after SOI and any APP0.
fn splice_jpeg_metadata(jpeg: &[u8], meta: &ImageMetadata) -> Vec<u8> {
    let mut insert_at = 2; // after SOI
    if jpeg.get(2..4) == Some(&[0xFF, 0xE0][..]) {
        if let Some(len) = jpeg.get(4..6) {
            insert_at = 4 + u16::from_be_bytes([len[0], len[1]]) as usize;
        }
    }
    let insert_at = insert_at.min(jpeg.len());

    let mut segments = Vec::new();
    if let Some(exif) = &meta.exif {
        let mut payload = EXIF_APP1_HEADER.to_vec();
        payload.extend_from_slice(exif);
        push_segment(&mut segments, 0xE1, &payload);
    }
    if let Some(icc) = &meta.icc_profile {
        let chunks: Vec<&[u8]> = icc.chunks(ICC_CHUNK_MAX).collect();
        let total = chunks.len().min(255) as u8;
        for (i, chunk) in chunks.iter().take(255).enumerate() {
            let mut payload = ICC_APP2_HEADER.to_vec();
            payload.push(i as u8 + 1);
            payload.push(total);
            payload.extend_from_slice(chunk);
            push_segment(&mut segments, 0xE2, &payload);
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + segments.len());
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&segments);
    out.extend_from_slice(&jpeg[insert_at..]);
    out
}

fn push_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    // Segment length counts itself; anything longer than a segment allows is dropped.
    let Ok(len) = u16::try_from(payload.len() + 2) else {
        debug!("metadata segment of {} bytes too large for JPEG", payload.len());
        return;
    };
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
}

// ── PNG metadata ─────────────────────────────────────────────────────────

/// Insert `iCCP` and `eXIf` chunks after IHDR.
fn splice_png_metadata(png: &[u8], meta: &ImageMetadata) -> std::io::Result<Vec<u8>> {
    // 8-byte signature + IHDR (4 len + 4 type + 13 data + 4 crc).
    const AFTER_IHDR: usize = 8 + 25;
    if png.len() < AFTER_IHDR {
        return Err(std::io::Error::other("PNG stream too short"));
    }

    let mut out = Vec::with_capacity(png.len() + 64);
    out.extend_from_slice(&png[..AFTER_IHDR]);

    if let Some(icc) = &meta.icc_profile {
        let mut data = b"ICC Profile\0\0".to_vec(); // name, NUL, compression method 0
        let mut z = ZlibEncoder::new(Vec::new(), Compression::best());
        z.write_all(icc)?;
        data.extend_from_slice(&z.finish()?);
        push_chunk(&mut out, b"iCCP", &data);
    }
    if let Some(exif) = &meta.exif {
        push_chunk(&mut out, b"eXIf", exif);
    }

    out.extend_from_slice(&png[AFTER_IHDR..]);
    Ok(out)
}

fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}
