//! Image → page layout.
//!
//! Each input image gets its own page. The page is sized in pixels at the
//! requested DPI (or taken from the image itself for [`PageSize::Fit`]), the
//! margin is removed from every side to form the drawable area, and the image
//! is contained in or made to cover that area. The result is centered on the
//! *full* page, so in cover mode the overflow spills into the margins before
//! being clipped at the page edge.
//!
//! ```text
//!   page (width_px × height_px)
//!   ┌──────────────────────────┐
//!   │ margin                   │
//!   │   ┌──────────────────┐   │
//!   │   │  drawable area   │   │
//!   │   │   ┌──────────┐   │   │
//!   │   │   │  image   │   │   │
//!   │   │   └──────────┘   │   │
//!   │   └──────────────────┘   │
//!   └──────────────────────────┘
//! ```

use crate::config::{Background, FitMode, Orientation, PageLayoutSpec, ResizeMode};
use crate::error::{PixelDriftError, Result};
use crate::pipeline::decode::RasterImage;
use crate::pipeline::geometry::{center_offset, compute_target_size, Placement, SizeRequest};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// One composed page, ready for embedding.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    pub pixels: DynamicImage,
    /// Physical page size in points. `pixels` covers it at the layout DPI.
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Convert a length in points to pixels at `dpi`.
pub fn points_to_pixels(points: u32, dpi: u32) -> u32 {
    ((points as f64 * dpi as f64) / POINTS_PER_INCH as f64).round() as u32
}

/// Page size in pixels for an image of `img_w × img_h`, orientation applied.
pub fn page_pixels(spec: &PageLayoutSpec, img_w: u32, img_h: u32) -> (u32, u32) {
    let (w, h) = match spec.page_size.points() {
        Some((w, h)) => (points_to_pixels(w, spec.dpi), points_to_pixels(h, spec.dpi)),
        None => (img_w, img_h),
    };
    match spec.orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

/// Where an `img_w × img_h` image lands on a `page_w × page_h` page.
///
/// The returned placement's canvas is the whole page; offsets are relative
/// to the page origin and negative where a covering image overflows.
///
/// # Errors
/// [`PixelDriftError::Validation`] when the margin leaves no drawable area.
pub fn place_on_page(
    img_w: u32,
    img_h: u32,
    page_w: u32,
    page_h: u32,
    margin_px: u32,
    fit: FitMode,
) -> Result<Placement> {
    let draw_w = page_w as i64 - 2 * margin_px as i64;
    let draw_h = page_h as i64 - 2 * margin_px as i64;
    if draw_w <= 0 || draw_h <= 0 {
        return Err(PixelDriftError::validation(format!(
            "margin of {margin_px}px leaves no drawable area on a {page_w}x{page_h}px page"
        )));
    }

    let req = SizeRequest {
        width: Some(draw_w as u32),
        height: Some(draw_h as u32),
        percentage: None,
        mode: match fit {
            FitMode::Contain => ResizeMode::Fit,
            FitMode::Cover => ResizeMode::Cover,
        },
        keep_ratio: true,
        prevent_upscale: false,
    };
    let inner = compute_target_size(img_w, img_h, &req)?;

    Ok(Placement {
        scaled_width: inner.scaled_width,
        scaled_height: inner.scaled_height,
        canvas_width: page_w,
        canvas_height: page_h,
        offset_x: center_offset(page_w, inner.scaled_width),
        offset_y: center_offset(page_h, inner.scaled_height),
    })
}

/// Compose one image onto its page.
pub fn layout_page(image: &RasterImage, spec: &PageLayoutSpec) -> Result<PageCanvas> {
    let (page_w, page_h) = page_pixels(spec, image.width(), image.height());
    let margin_px = points_to_pixels(spec.margin, spec.dpi);
    let p = place_on_page(
        image.width(),
        image.height(),
        page_w,
        page_h,
        margin_px,
        spec.fit_mode,
    )?;
    debug!(
        "page {}x{}px: image {}x{} → {}x{} at ({}, {})",
        page_w,
        page_h,
        image.width(),
        image.height(),
        p.scaled_width,
        p.scaled_height,
        p.offset_x,
        p.offset_y
    );

    let scaled = image
        .pixels
        .resize_exact(p.scaled_width, p.scaled_height, FilterType::Lanczos3);
    let pixels = compose(&scaled, &p, spec.background);

    let pt = |px: u32| px as f32 * POINTS_PER_INCH / spec.dpi as f32;
    Ok(PageCanvas {
        pixels,
        width_pt: pt(page_w),
        height_pt: pt(page_h),
    })
}

/// Lay out every image on its own page, preserving input order.
pub fn layout_images_to_pages(
    images: &[RasterImage],
    spec: &PageLayoutSpec,
) -> Result<Vec<PageCanvas>> {
    spec.validate()?;
    if images.is_empty() {
        return Err(PixelDriftError::validation(
            "at least one image is required to build a document",
        ));
    }
    images.iter().map(|img| layout_page(img, spec)).collect()
}

fn compose(scaled: &DynamicImage, p: &Placement, background: Background) -> DynamicImage {
    let mut canvas =
        RgbaImage::from_pixel(p.canvas_width, p.canvas_height, image::Rgba(background.rgba()));
    // overlay clips anything outside the canvas.
    imageops::overlay(&mut canvas, &scaled.to_rgba8(), p.offset_x, p.offset_y);

    if background.is_transparent() {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}
