//! Resize policy: source dimensions + sizing request → placement.
//!
//! Every resize in the crate goes through [`compute_target_size`], including
//! the page layout engine, which asks for `Fit` (contain) or `Cover` against
//! the drawable area of a page. Keeping one sizing function means the
//! upscale clamp lives in exactly one place.
//!
//! A [`Placement`] describes two rectangles:
//!
//! ```text
//!   canvas (output size)
//!   ┌───────────────────────┐
//!   │   offset              │
//!   │    ┌─────────────┐    │
//!   │    │   scaled    │    │
//!   │    └─────────────┘    │
//!   └───────────────────────┘
//! ```
//!
//! For `Fit`, `Stretch` and single-dimension requests the two coincide. For
//! `Pad` the scaled image sits centered inside a larger canvas. For `Cover`
//! the scaled image is larger than the canvas and the offset is negative:
//! the overflow is cropped equally from both sides.

use crate::config::ResizeMode;
use crate::error::{PixelDriftError, Result};
use serde::{Deserialize, Serialize};

/// The sizing part of a transform request.
///
/// Exactly one of these shapes is accepted:
/// `percentage` alone, `width` alone, `height` alone, or `width` + `height`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Uniform scale in percent (100 = unchanged).
    pub percentage: Option<f64>,
    /// Only consulted when both `width` and `height` are set.
    pub mode: ResizeMode,
    pub keep_ratio: bool,
    pub prevent_upscale: bool,
}

/// Where a resampled image lands on its output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Dimensions the source is resampled to.
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Dimensions of the produced image.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Top-left of the scaled image relative to the canvas. Negative on an
    /// axis where the scaled image overflows (cover).
    pub offset_x: i64,
    pub offset_y: i64,
}

impl Placement {
    fn same(width: u32, height: u32) -> Self {
        Placement {
            scaled_width: width,
            scaled_height: height,
            canvas_width: width,
            canvas_height: height,
            offset_x: 0,
            offset_y: 0,
        }
    }

    fn framed(scaled: (u32, u32), canvas: (u32, u32)) -> Self {
        Placement {
            scaled_width: scaled.0,
            scaled_height: scaled.1,
            canvas_width: canvas.0,
            canvas_height: canvas.1,
            offset_x: center_offset(canvas.0, scaled.0),
            offset_y: center_offset(canvas.1, scaled.1),
        }
    }

    /// True when the scaled image fills the canvas exactly at the origin.
    pub fn is_identity_frame(&self) -> bool {
        self.scaled_width == self.canvas_width
            && self.scaled_height == self.canvas_height
            && self.offset_x == 0
            && self.offset_y == 0
    }
}

/// Integer-floor centering offset of `inner` within `outer`.
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    (outer as i64 - inner as i64).div_euclid(2)
}

/// Compute the output size and placement for a source of `src_w × src_h`.
///
/// # Errors
/// [`PixelDriftError::Validation`] when the request does not have exactly one
/// sizing shape, when a requested dimension is zero, when the percentage is
/// not positive, or when the source itself is empty.
pub fn compute_target_size(src_w: u32, src_h: u32, req: &SizeRequest) -> Result<Placement> {
    if src_w == 0 || src_h == 0 {
        return Err(PixelDriftError::validation(format!(
            "source dimensions must be positive, got {src_w}x{src_h}"
        )));
    }

    let placement = match (req.percentage, req.width, req.height) {
        (Some(pct), None, None) => {
            if !pct.is_finite() || pct <= 0.0 {
                return Err(PixelDriftError::validation(format!(
                    "percentage must be positive, got {pct}"
                )));
            }
            let f = pct / 100.0;
            Placement::same(scale_dim(src_w, f), scale_dim(src_h, f))
        }
        (None, Some(w), None) => {
            require_positive("width", w)?;
            let h = if req.keep_ratio {
                scale_dim(src_h, w as f64 / src_w as f64)
            } else {
                src_h
            };
            Placement::same(w, h)
        }
        (None, None, Some(h)) => {
            require_positive("height", h)?;
            let w = if req.keep_ratio {
                scale_dim(src_w, h as f64 / src_h as f64)
            } else {
                src_w
            };
            Placement::same(w, h)
        }
        (None, Some(w), Some(h)) => {
            require_positive("width", w)?;
            require_positive("height", h)?;
            boxed(src_w, src_h, w, h, req.mode, req.keep_ratio)
        }
        (None, None, None) => {
            return Err(PixelDriftError::validation(
                "one of percentage, width or height is required",
            ))
        }
        _ => {
            return Err(PixelDriftError::validation(
                "percentage cannot be combined with width or height",
            ))
        }
    };

    Ok(if req.prevent_upscale {
        clamp_to_source(placement, src_w, src_h)
    } else {
        placement
    })
}

/// Uniform scale factor that fits `src` inside `box` (`cover = false`) or
/// fills it (`cover = true`).
pub fn box_scale(src_w: u32, src_h: u32, box_w: u32, box_h: u32, cover: bool) -> f64 {
    let sx = box_w as f64 / src_w as f64;
    let sy = box_h as f64 / src_h as f64;
    if cover {
        sx.max(sy)
    } else {
        sx.min(sy)
    }
}

fn boxed(src_w: u32, src_h: u32, w: u32, h: u32, mode: ResizeMode, keep_ratio: bool) -> Placement {
    match mode {
        ResizeMode::Fit if keep_ratio => {
            let s = box_scale(src_w, src_h, w, h, false);
            let scaled = (contain_dim(src_w, s, w), contain_dim(src_h, s, h));
            Placement::same(scaled.0, scaled.1)
        }
        ResizeMode::Fit | ResizeMode::Stretch => Placement::same(w, h),
        ResizeMode::Pad => {
            let s = box_scale(src_w, src_h, w, h, false);
            let scaled = (contain_dim(src_w, s, w), contain_dim(src_h, s, h));
            Placement::framed(scaled, (w, h))
        }
        ResizeMode::Cover => {
            let s = box_scale(src_w, src_h, w, h, true);
            let scaled = (scale_dim(src_w, s).max(w), scale_dim(src_h, s).max(h));
            Placement::framed(scaled, (w, h))
        }
    }
}

/// Clamp both rectangles to the source size and re-center.
fn clamp_to_source(p: Placement, src_w: u32, src_h: u32) -> Placement {
    let scaled = (p.scaled_width.min(src_w), p.scaled_height.min(src_h));
    let canvas = (p.canvas_width.min(src_w), p.canvas_height.min(src_h));
    Placement::framed(scaled, canvas)
}

fn require_positive(name: &str, v: u32) -> Result<()> {
    if v == 0 {
        return Err(PixelDriftError::validation(format!(
            "{name} must be a positive number of pixels"
        )));
    }
    Ok(())
}

/// `round(dim × factor)`, never below one pixel.
pub(crate) fn scale_dim(dim: u32, factor: f64) -> u32 {
    let v = (dim as f64 * factor).round();
    if v < 1.0 {
        1
    } else if v >= u32::MAX as f64 {
        u32::MAX
    } else {
        v as u32
    }
}

// Rounding can push a contained edge one pixel past the box.
fn contain_dim(dim: u32, factor: f64, limit: u32) -> u32 {
    scale_dim(dim, factor).min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn both(w: u32, h: u32, mode: ResizeMode) -> SizeRequest {
        SizeRequest {
            width: Some(w),
            height: Some(h),
            mode,
            keep_ratio: true,
            ..Default::default()
        }
    }

    #[test]
    fn percentage_rounds_with_floor_of_one() {
        let req = SizeRequest {
            percentage: Some(50.0),
            ..Default::default()
        };
        let p = compute_target_size(101, 3, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (51, 2));

        let req = SizeRequest {
            percentage: Some(1.0),
            ..Default::default()
        };
        let p = compute_target_size(1, 1, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (1, 1));
    }

    #[test]
    fn width_only_keeps_ratio_or_source_height() {
        let mut req = SizeRequest {
            width: Some(200),
            keep_ratio: true,
            ..Default::default()
        };
        let p = compute_target_size(400, 300, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (200, 150));

        req.keep_ratio = false;
        let p = compute_target_size(400, 300, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (200, 300));
    }

    #[test]
    fn height_only_keeps_ratio() {
        let req = SizeRequest {
            height: Some(150),
            keep_ratio: true,
            ..Default::default()
        };
        let p = compute_target_size(400, 300, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (200, 150));
    }

    #[test]
    fn fit_contains() {
        let p = compute_target_size(400, 300, &both(100, 100, ResizeMode::Fit)).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (100, 75));
        assert!(p.is_identity_frame());
    }

    #[test]
    fn fit_without_ratio_stretches() {
        let mut req = both(100, 100, ResizeMode::Fit);
        req.keep_ratio = false;
        let p = compute_target_size(400, 300, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (100, 100));
    }

    #[test]
    fn stretch_is_exact() {
        let p = compute_target_size(400, 300, &both(90, 10, ResizeMode::Stretch)).unwrap();
        assert_eq!((p.scaled_width, p.scaled_height), (90, 10));
        assert!(p.is_identity_frame());
    }

    #[test]
    fn pad_centers_contained_image() {
        let p = compute_target_size(100, 200, &both(300, 300, ResizeMode::Pad)).unwrap();
        assert_eq!((p.scaled_width, p.scaled_height), (150, 300));
        assert_eq!((p.canvas_width, p.canvas_height), (300, 300));
        assert_eq!((p.offset_x, p.offset_y), (75, 0));
    }

    #[test]
    fn cover_overflows_and_crops_centered() {
        let p = compute_target_size(100, 200, &both(300, 300, ResizeMode::Cover)).unwrap();
        assert_eq!((p.scaled_width, p.scaled_height), (300, 600));
        assert_eq!((p.canvas_width, p.canvas_height), (300, 300));
        assert_eq!((p.offset_x, p.offset_y), (0, -150));
    }

    #[test]
    fn prevent_upscale_clamps_after_mode() {
        let mut req = both(300, 300, ResizeMode::Stretch);
        req.prevent_upscale = true;
        let p = compute_target_size(100, 200, &req).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (100, 200));
    }

    #[test]
    fn rejects_bad_shapes() {
        let none = SizeRequest::default();
        assert!(compute_target_size(10, 10, &none).unwrap_err().is_validation_error());

        let mixed = SizeRequest {
            percentage: Some(50.0),
            width: Some(10),
            ..Default::default()
        };
        assert!(compute_target_size(10, 10, &mixed).is_err());

        let zero = SizeRequest {
            width: Some(0),
            ..Default::default()
        };
        assert!(compute_target_size(10, 10, &zero).is_err());

        let negative = SizeRequest {
            percentage: Some(-5.0),
            ..Default::default()
        };
        assert!(compute_target_size(10, 10, &negative).is_err());
    }

    #[test]
    fn center_offset_floors() {
        assert_eq!(center_offset(5, 2), 1);
        assert_eq!(center_offset(2, 5), -2);
    }

    fn any_mode() -> impl Strategy<Value = ResizeMode> {
        prop_oneof![
            Just(ResizeMode::Fit),
            Just(ResizeMode::Stretch),
            Just(ResizeMode::Pad),
            Just(ResizeMode::Cover),
        ]
    }

    proptest! {
        #[test]
        fn fit_never_exceeds_box(sw in 1u32..4000, sh in 1u32..4000, w in 1u32..4000, h in 1u32..4000) {
            let p = compute_target_size(sw, sh, &both(w, h, ResizeMode::Fit)).unwrap();
            prop_assert!(p.canvas_width <= w && p.canvas_height <= h);
            let p = compute_target_size(sw, sh, &both(w, h, ResizeMode::Pad)).unwrap();
            prop_assert!(p.scaled_width <= w && p.scaled_height <= h);
            prop_assert!(p.offset_x >= 0 && p.offset_y >= 0);
        }

        #[test]
        fn cover_never_smaller_than_box(sw in 1u32..4000, sh in 1u32..4000, w in 1u32..4000, h in 1u32..4000) {
            let p = compute_target_size(sw, sh, &both(w, h, ResizeMode::Cover)).unwrap();
            prop_assert!(p.scaled_width >= w && p.scaled_height >= h);
            prop_assert_eq!((p.canvas_width, p.canvas_height), (w, h));
        }

        #[test]
        fn prevent_upscale_bounds_every_mode(
            sw in 1u32..2000, sh in 1u32..2000,
            w in 1u32..4000, h in 1u32..4000,
            mode in any_mode(),
            keep in any::<bool>(),
        ) {
            let req = SizeRequest { width: Some(w), height: Some(h), mode, keep_ratio: keep, prevent_upscale: true, percentage: None };
            let p = compute_target_size(sw, sh, &req).unwrap();
            prop_assert!(p.canvas_width <= sw && p.canvas_height <= sh);
            prop_assert!(p.scaled_width <= sw && p.scaled_height <= sh);
        }

        #[test]
        fn exactly_one_shape_accepted(
            w in proptest::option::of(1u32..500),
            h in proptest::option::of(1u32..500),
            pct in proptest::option::of(1.0f64..300.0),
        ) {
            let req = SizeRequest { width: w, height: h, percentage: pct, keep_ratio: true, ..Default::default() };
            let valid = match (pct, w, h) {
                (Some(_), None, None) | (None, Some(_), None) | (None, None, Some(_)) | (None, Some(_), Some(_)) => true,
                _ => false,
            };
            let got = compute_target_size(64, 48, &req);
            prop_assert_eq!(got.is_ok(), valid);
            if let Err(e) = got {
                prop_assert!(e.is_validation_error());
            }
        }
    }
}
