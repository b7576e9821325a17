//! Pixel transforms driven by a [`Placement`]: resample, frame, sharpen.
//!
//! Every step returns a new owned buffer; nothing aliases the input.

use crate::config::{Background, CompressSpec, ResizeMode, TransformSpec};
use crate::error::Result;
use crate::pipeline::decode::RasterImage;
use crate::pipeline::geometry::{compute_target_size, Placement, SizeRequest};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// Smoothing kernel used as the "zero sharpness" reference. `filter3x3`
/// normalises by the kernel sum (13).
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

/// Resize (and frame) per `spec.size`, then sharpen.
pub fn apply_transform(image: RasterImage, spec: &TransformSpec) -> Result<RasterImage> {
    let placement = compute_target_size(image.width(), image.height(), &spec.size)?;
    debug!(
        "{}x{} → scaled {}x{}, canvas {}x{} at ({}, {})",
        image.width(),
        image.height(),
        placement.scaled_width,
        placement.scaled_height,
        placement.canvas_width,
        placement.canvas_height,
        placement.offset_x,
        placement.offset_y
    );

    let pixels = render_placement(&image.pixels, &placement, spec.background);
    let pixels = if spec.sharpen > 0.0 && spec.sharpen != 1.0 {
        sharpen(&pixels, spec.sharpen)
    } else {
        pixels
    };
    Ok(image.with_pixels(pixels))
}

/// Downscale for compression: percentage first, then the optional
/// `max_width`/`max_height` box. Never upscales.
pub fn apply_compress_resize(image: RasterImage, spec: &CompressSpec) -> Result<RasterImage> {
    let mut image = image;

    if spec.resize_percent < 100 {
        let req = SizeRequest {
            percentage: Some(spec.resize_percent as f64),
            prevent_upscale: true,
            ..SizeRequest::default()
        };
        let p = compute_target_size(image.width(), image.height(), &req)?;
        let pixels = render_placement(&image.pixels, &p, Background::default());
        image = image.with_pixels(pixels);
    }

    if spec.max_width.is_some() || spec.max_height.is_some() {
        let req = SizeRequest {
            width: spec.max_width,
            height: spec.max_height,
            mode: ResizeMode::Fit,
            keep_ratio: true,
            prevent_upscale: true,
            percentage: None,
        };
        let p = compute_target_size(image.width(), image.height(), &req)?;
        let pixels = render_placement(&image.pixels, &p, Background::default());
        image = image.with_pixels(pixels);
    }

    Ok(image)
}

/// Resample `src` to the placement's scaled size and position it on a
/// canvas of the placement's canvas size.
pub fn render_placement(
    src: &DynamicImage,
    placement: &Placement,
    background: Background,
) -> DynamicImage {
    let scaled = resample(src, placement.scaled_width, placement.scaled_height);
    if placement.is_identity_frame() {
        return scaled;
    }

    // Pure crop: the scaled image covers the whole canvas.
    let covers = placement.offset_x <= 0
        && placement.offset_y <= 0
        && placement.offset_x + scaled.width() as i64 >= placement.canvas_width as i64
        && placement.offset_y + scaled.height() as i64 >= placement.canvas_height as i64;
    if covers {
        return scaled.crop_imm(
            (-placement.offset_x) as u32,
            (-placement.offset_y) as u32,
            placement.canvas_width,
            placement.canvas_height,
        );
    }

    let mut canvas = RgbaImage::from_pixel(
        placement.canvas_width,
        placement.canvas_height,
        image::Rgba(background.rgba()),
    );
    imageops::overlay(
        &mut canvas,
        &scaled.to_rgba8(),
        placement.offset_x,
        placement.offset_y,
    );

    let keep_alpha = background.is_transparent() || src.color().has_alpha();
    let canvas = DynamicImage::ImageRgba8(canvas);
    if keep_alpha {
        canvas
    } else {
        DynamicImage::ImageRgb8(canvas.to_rgb8())
    }
}

fn resample(src: &DynamicImage, w: u32, h: u32) -> DynamicImage {
    if src.width() == w && src.height() == h {
        src.clone()
    } else {
        src.resize_exact(w, h, FilterType::Lanczos3)
    }
}

/// Sharpness enhancement: interpolate between a smoothed copy (factor 0)
/// and the original (factor 1). Factors above 1 extrapolate past the
/// original and sharpen.
pub fn sharpen(img: &DynamicImage, factor: f32) -> DynamicImage {
    let mut out = to_8bit(img);
    let (w, h) = (out.width() as usize, out.height() as usize);
    let has_alpha = out.color().has_alpha();
    let smooth = out.filter3x3(&SMOOTH_KERNEL);
    let smooth_bytes = smooth.as_bytes();

    if let Some(bytes) = bytes_mut(&mut out) {
        let channels = bytes.len() / (w * h).max(1);
        for (i, (o, &s)) in bytes.iter_mut().zip(smooth_bytes).enumerate() {
            let (px, ch) = (i / channels, i % channels);
            let (x, y) = (px % w, px / w);
            // Border pixels have no full neighbourhood; alpha is not sharpened.
            if x == 0 || y == 0 || x + 1 == w || y + 1 == h || (has_alpha && ch + 1 == channels) {
                continue;
            }
            let v = s as f32 + factor * (*o as f32 - s as f32);
            *o = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn bytes_mut(img: &mut DynamicImage) -> Option<&mut [u8]> {
    match img {
        DynamicImage::ImageLuma8(b) => Some(b),
        DynamicImage::ImageLumaA8(b) => Some(b),
        DynamicImage::ImageRgb8(b) => Some(b),
        DynamicImage::ImageRgba8(b) => Some(b),
        _ => None,
    }
}

fn to_8bit(img: &DynamicImage) -> DynamicImage {
    let c = img.color();
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img.clone(),
        _ => match (c.has_color(), c.has_alpha()) {
            (false, false) => DynamicImage::ImageLuma8(img.to_luma8()),
            (false, true) => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
            (true, false) => DynamicImage::ImageRgb8(img.to_rgb8()),
            (true, true) => DynamicImage::ImageRgba8(img.to_rgba8()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba};

    fn solid(w: u32, h: u32) -> RasterImage {
        RasterImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            w,
            h,
            Rgb([0, 0, 255]),
        )))
    }

    #[test]
    fn pad_fills_background_around_contained_image() {
        let spec = TransformSpec::builder()
            .width(300)
            .height(300)
            .mode(ResizeMode::Pad)
            .prevent_upscale(false)
            .background(Background::Color([255, 0, 0]))
            .build()
            .unwrap();
        let out = apply_transform(solid(100, 200), &spec).unwrap();
        assert_eq!((out.width(), out.height()), (300, 300));
        let rgb = out.pixels.to_rgb8();
        assert_eq!(rgb.get_pixel(10, 150), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(150, 150), &Rgb([0, 0, 255]));
        assert_eq!(rgb.get_pixel(290, 150), &Rgb([255, 0, 0]));
    }

    #[test]
    fn cover_crops_to_box() {
        let spec = TransformSpec::builder()
            .width(300)
            .height(300)
            .mode(ResizeMode::Cover)
            .prevent_upscale(false)
            .build()
            .unwrap();
        let out = apply_transform(solid(100, 200), &spec).unwrap();
        assert_eq!((out.width(), out.height()), (300, 300));
    }

    #[test]
    fn transparent_pad_keeps_alpha() {
        let spec = TransformSpec::builder()
            .width(20)
            .height(10)
            .mode(ResizeMode::Pad)
            .prevent_upscale(false)
            .format(OutputFormat::Png)
            .background(Background::Transparent)
            .build()
            .unwrap();
        let out = apply_transform(solid(10, 10), &spec).unwrap();
        let rgba = out.pixels.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 5), &Rgba([0, 0, 0, 0]));
        assert_eq!(rgba.get_pixel(10, 5)[3], 255);
    }

    #[test]
    fn compress_resize_percent_then_box() {
        let spec = CompressSpec::builder()
            .resize_percent(50)
            .max_width(150)
            .build()
            .unwrap();
        let out = apply_compress_resize(solid(600, 400), &spec).unwrap();
        assert_eq!((out.width(), out.height()), (150, 100));
    }

    #[test]
    fn compress_resize_never_upscales() {
        let spec = CompressSpec::builder()
            .max_width(1000)
            .max_height(1000)
            .build()
            .unwrap();
        let out = apply_compress_resize(solid(120, 80), &spec).unwrap();
        assert_eq!((out.width(), out.height()), (120, 80));
    }

    #[test]
    fn sharpen_identity_and_flat_regions() {
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 5, Luma([90])));
        let out = sharpen(&flat, 2.0).to_luma8();
        assert!(out.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn sharpen_increases_edge_contrast() {
        let mut img = GrayImage::from_pixel(6, 6, Luma([50]));
        for y in 0..6 {
            for x in 3..6 {
                img.put_pixel(x, y, Luma([200]));
            }
        }
        let img = DynamicImage::ImageLuma8(img);
        let out = sharpen(&img, 3.0).to_luma8();
        assert!(out.get_pixel(2, 3)[0] < 50);
        assert!(out.get_pixel(3, 3)[0] > 200);
    }
}
