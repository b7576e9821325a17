//! Output format + quality + metadata policy → encoder configuration.
//!
//! This is a pure mapping. It never touches pixels; [`crate::pipeline::encode`]
//! reads the resulting [`EncoderConfig`] and does the work, including the
//! mandatory alpha flattening for formats that cannot carry transparency.

use crate::config::OutputFormat;
use crate::error::{PixelDriftError, Result};
use serde::{Deserialize, Serialize};

/// Chroma subsampling applied by lossy encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromaSubsampling {
    /// 4:2:0, the moderate default for photographic content.
    Yuv420,
}

/// Effort spent by lossless encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionEffort {
    Default,
    Maximum,
}

/// Everything the encode stage needs to know about one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub format: OutputFormat,
    /// Lossy quality, 1–100. `None` for lossless formats.
    pub quality: Option<u8>,
    /// `Some` only for lossy formats.
    pub chroma_subsampling: Option<ChromaSubsampling>,
    /// Optimised entropy coding. Always on.
    pub optimize: bool,
    pub compression_effort: CompressionEffort,
    /// Composite any alpha over white and emit opaque RGB.
    pub flatten_alpha: bool,
    /// Carry EXIF and ICC through to the output.
    pub keep_metadata: bool,
}

/// Build the encoder configuration for one output.
///
/// Quality is passed through verbatim for lossy formats and ignored for the
/// rest. Formats without an alpha channel always flatten.
pub fn build_encoder_config(
    format: OutputFormat,
    quality: u8,
    keep_metadata: bool,
) -> Result<EncoderConfig> {
    if !(1..=100).contains(&quality) {
        return Err(PixelDriftError::validation(format!(
            "quality must be 1–100, got {quality}"
        )));
    }

    let lossy = format.is_lossy();
    Ok(EncoderConfig {
        format,
        quality: lossy.then_some(quality),
        chroma_subsampling: lossy.then_some(ChromaSubsampling::Yuv420),
        optimize: true,
        compression_effort: if lossy {
            CompressionEffort::Default
        } else {
            CompressionEffort::Maximum
        },
        flatten_alpha: !format.supports_alpha(),
        keep_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_passes_quality_and_flattens() {
        let c = build_encoder_config(OutputFormat::Jpeg, 42, false).unwrap();
        assert_eq!(c.quality, Some(42));
        assert_eq!(c.chroma_subsampling, Some(ChromaSubsampling::Yuv420));
        assert!(c.optimize);
        assert!(c.flatten_alpha);
        assert!(!c.keep_metadata);
    }

    #[test]
    fn png_ignores_quality() {
        let c = build_encoder_config(OutputFormat::Png, 10, true).unwrap();
        assert_eq!(c.quality, None);
        assert_eq!(c.compression_effort, CompressionEffort::Maximum);
        assert!(!c.flatten_alpha);
        assert!(c.keep_metadata);
    }

    #[test]
    fn bmp_flattens_without_quality() {
        let c = build_encoder_config(OutputFormat::Bmp, 80, false).unwrap();
        assert!(c.flatten_alpha);
        assert_eq!(c.quality, None);
    }

    #[test]
    fn webp_keeps_alpha() {
        let c = build_encoder_config(OutputFormat::Webp, 70, false).unwrap();
        assert_eq!(c.quality, Some(70));
        assert!(!c.flatten_alpha);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        assert!(build_encoder_config(OutputFormat::Jpeg, 0, false).is_err());
        assert!(build_encoder_config(OutputFormat::Jpeg, 101, false).is_err());
    }
}
