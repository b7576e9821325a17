//! Configuration types for pixeldrift operations.
//!
//! Two layers of configuration exist:
//!
//! * [`EngineConfig`]: runtime knobs shared by every operation (batch
//!   concurrency, input size cap, progress reporting, pdfium location).
//! * Request specs ([`TransformSpec`], [`CompressSpec`], [`ConvertSpec`],
//!   [`PageLayoutSpec`], [`RasterCompressSpec`]): what a single call should
//!   do to its assets.
//!
//! Every type has a builder whose `build()` validates the invariants and
//! returns [`PixelDriftError::Validation`] on violation. Operations also
//! re-validate specs they receive, so a spec assembled by hand through its
//! public fields is held to the same rules.

use crate::error::{PixelDriftError, Result};
use crate::pipeline::geometry::SizeRequest;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default cap on a single input asset: 50 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

// ── Engine configuration ─────────────────────────────────────────────────

/// Runtime configuration shared by all operations.
///
/// # Example
/// ```rust
/// use pixeldrift::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .concurrency(8)
///     .max_input_bytes(10 * 1024 * 1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// Maximum number of batch items transformed at once. Default: 4.
    pub concurrency: usize,

    /// Largest accepted input asset in bytes. Default: 50 MiB.
    ///
    /// Checked before any decode attempt.
    pub max_input_bytes: usize,

    /// Optional progress observer for batch operations.
    pub progress_callback: Option<ProgressCallback>,

    /// Explicit pdfium shared library location. When unset, `PDFIUM_LIB_PATH`
    /// is consulted, then the system library search path.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            progress_callback: None,
            pdfium_library_path: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("concurrency", &self.concurrency)
            .field("max_input_bytes", &self.max_input_bytes)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_input_bytes(mut self, bytes: usize) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(PixelDriftError::validation("concurrency must be ≥ 1"));
        }
        if c.max_input_bytes == 0 {
            return Err(PixelDriftError::validation(
                "max_input_bytes must be positive",
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How a `width × height` box is honoured when both dimensions are given.
///
/// | Mode      | Output size      | Aspect kept | Crops |
/// |-----------|------------------|-------------|-------|
/// | `Fit`     | inside the box   | with `keep_ratio` | no |
/// | `Stretch` | exactly the box  | no          | no    |
/// | `Pad`     | exactly the box  | yes         | no (fills background) |
/// | `Cover`   | exactly the box  | yes         | yes (centered) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    #[default]
    Fit,
    Stretch,
    Pad,
    Cover,
}

impl FromStr for ResizeMode {
    type Err = PixelDriftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" | "contain" => Ok(ResizeMode::Fit),
            "stretch" => Ok(ResizeMode::Stretch),
            "pad" => Ok(ResizeMode::Pad),
            "cover" => Ok(ResizeMode::Cover),
            other => Err(PixelDriftError::validation(format!(
                "unknown resize mode '{other}' (expected fit, stretch, pad or cover)"
            ))),
        }
    }
}

/// Raster output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    /// Whether the encoder can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(
            self,
            OutputFormat::Png | OutputFormat::Webp | OutputFormat::Tiff
        )
    }

    /// Whether a caller quality is meaningful for this format.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Webp)
    }
}

impl FromStr for OutputFormat {
    type Err = PixelDriftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            other => Err(PixelDriftError::validation(format!(
                "unsupported output format '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        })
    }
}

/// Canvas fill behind padded or letterboxed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Opaque RGB colour.
    Color([u8; 3]),
    /// Fully transparent. Only valid when the output can carry alpha.
    Transparent,
}

impl Default for Background {
    fn default() -> Self {
        Background::Color([255, 255, 255])
    }
}

impl Background {
    pub fn is_transparent(self) -> bool {
        matches!(self, Background::Transparent)
    }

    /// RGBA fill value.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Background::Color([r, g, b]) => [r, g, b, 255],
            Background::Transparent => [0, 0, 0, 0],
        }
    }
}

impl FromStr for Background {
    type Err = PixelDriftError;

    /// Accepts `transparent`, `white`, `black`, `#RGB` and `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim().to_ascii_lowercase();
        match t.as_str() {
            "transparent" | "none" => return Ok(Background::Transparent),
            "white" => return Ok(Background::Color([255, 255, 255])),
            "black" => return Ok(Background::Color([0, 0, 0])),
            _ => {}
        }
        let bad = || PixelDriftError::validation(format!("invalid background colour '{s}'"));
        let hex = t.strip_prefix('#').unwrap_or(&t);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(bad()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| bad());
        Ok(Background::Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

/// Named page sizes for image → PDF layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    /// Each page takes the dimensions of its own image.
    Fit,
}

impl PageSize {
    /// Portrait dimensions in PDF points (1/72 inch); `None` for [`PageSize::Fit`].
    pub fn points(self) -> Option<(u32, u32)> {
        match self {
            PageSize::A3 => Some((842, 1191)),
            PageSize::A4 => Some((595, 842)),
            PageSize::A5 => Some((420, 595)),
            PageSize::Letter => Some((612, 792)),
            PageSize::Legal => Some((612, 1008)),
            PageSize::Fit => None,
        }
    }
}

impl FromStr for PageSize {
    type Err = PixelDriftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A3" => Ok(PageSize::A3),
            "A4" => Ok(PageSize::A4),
            "A5" => Ok(PageSize::A5),
            "LETTER" => Ok(PageSize::Letter),
            "LEGAL" => Ok(PageSize::Legal),
            "FIT" => Ok(PageSize::Fit),
            other => Err(PixelDriftError::validation(format!(
                "unknown page size '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    /// Swaps page width and height.
    Landscape,
}

/// How an image is placed inside a page's drawable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Whole image visible, letterboxed.
    #[default]
    Contain,
    /// Drawable area filled, overflow clipped by the page.
    Cover,
}

// ── Validation helpers ───────────────────────────────────────────────────

fn check_quality(q: u8) -> Result<()> {
    if !(1..=100).contains(&q) {
        return Err(PixelDriftError::validation(format!(
            "quality must be 1–100, got {q}"
        )));
    }
    Ok(())
}

fn check_dpi(dpi: u32) -> Result<()> {
    if !(72..=300).contains(&dpi) {
        return Err(PixelDriftError::validation(format!(
            "DPI must be 72–300, got {dpi}"
        )));
    }
    Ok(())
}

fn check_transparency(bg: Background, format: OutputFormat) -> Result<()> {
    if bg.is_transparent() && !format.supports_alpha() {
        return Err(PixelDriftError::validation(format!(
            "transparent background requires an alpha-capable format, {format} has none"
        )));
    }
    Ok(())
}

// ── TransformSpec ────────────────────────────────────────────────────────

/// Resize + sharpen + re-encode request for [`crate::resize_images`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub size: SizeRequest,
    /// Sharpness factor, ≥ 0. `1.0` leaves the image untouched, `0.0` blurs,
    /// values above 1 sharpen. Default: 1.0.
    pub sharpen: f32,
    /// Default: JPEG.
    pub format: OutputFormat,
    /// 1–100, used by lossy formats. Default: 85.
    pub quality: u8,
    /// Default: false.
    pub keep_metadata: bool,
    /// Fill for `Pad` mode. Default: white.
    pub background: Background,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            size: SizeRequest {
                keep_ratio: true,
                prevent_upscale: true,
                ..SizeRequest::default()
            },
            sharpen: 1.0,
            format: OutputFormat::Jpeg,
            quality: 85,
            keep_metadata: false,
            background: Background::default(),
        }
    }
}

impl TransformSpec {
    pub fn builder() -> TransformSpecBuilder {
        TransformSpecBuilder {
            spec: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.size;
        match (s.percentage, s.width, s.height) {
            (Some(_), None, None) | (None, Some(_), None) | (None, None, Some(_)) => {}
            (None, Some(_), Some(_)) => {}
            (None, None, None) => {
                return Err(PixelDriftError::validation(
                    "provide width, height or percentage",
                ))
            }
            _ => {
                return Err(PixelDriftError::validation(
                    "percentage cannot be combined with width or height",
                ))
            }
        }
        if s.width == Some(0) || s.height == Some(0) {
            return Err(PixelDriftError::validation(
                "width and height must be positive",
            ));
        }
        if let Some(p) = s.percentage {
            if !p.is_finite() || p <= 0.0 {
                return Err(PixelDriftError::validation(format!(
                    "percentage must be positive, got {p}"
                )));
            }
        }
        if !self.sharpen.is_finite() || self.sharpen < 0.0 {
            return Err(PixelDriftError::validation(format!(
                "sharpen factor must be ≥ 0, got {}",
                self.sharpen
            )));
        }
        check_quality(self.quality)?;
        check_transparency(self.background, self.format)
    }
}

/// Builder for [`TransformSpec`].
#[derive(Debug)]
pub struct TransformSpecBuilder {
    spec: TransformSpec,
}

impl TransformSpecBuilder {
    pub fn width(mut self, w: u32) -> Self {
        self.spec.size.width = Some(w);
        self
    }

    pub fn height(mut self, h: u32) -> Self {
        self.spec.size.height = Some(h);
        self
    }

    pub fn percentage(mut self, pct: f64) -> Self {
        self.spec.size.percentage = Some(pct);
        self
    }

    pub fn mode(mut self, mode: ResizeMode) -> Self {
        self.spec.size.mode = mode;
        self
    }

    pub fn keep_ratio(mut self, v: bool) -> Self {
        self.spec.size.keep_ratio = v;
        self
    }

    pub fn prevent_upscale(mut self, v: bool) -> Self {
        self.spec.size.prevent_upscale = v;
        self
    }

    pub fn sharpen(mut self, factor: f32) -> Self {
        self.spec.sharpen = factor;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.spec.format = format;
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.spec.quality = q;
        self
    }

    pub fn keep_metadata(mut self, v: bool) -> Self {
        self.spec.keep_metadata = v;
        self
    }

    pub fn background(mut self, bg: Background) -> Self {
        self.spec.background = bg;
        self
    }

    pub fn build(self) -> Result<TransformSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

// ── CompressSpec ─────────────────────────────────────────────────────────

/// Single-image compression request for [`crate::compress_image`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressSpec {
    /// 1–100. Default: 75.
    pub quality: u8,
    /// Uniform downscale applied first, 10–100. Default: 100.
    pub resize_percent: u8,
    /// Bounding box applied after the percentage step. Each bound ≥ 100.
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Default: JPEG.
    pub format: OutputFormat,
    /// Extension used in the output name (`jpg` vs `jpeg` is the caller's choice).
    pub extension: String,
    pub keep_metadata: bool,
}

impl Default for CompressSpec {
    fn default() -> Self {
        Self {
            quality: 75,
            resize_percent: 100,
            max_width: None,
            max_height: None,
            format: OutputFormat::Jpeg,
            extension: "jpeg".into(),
            keep_metadata: false,
        }
    }
}

impl CompressSpec {
    pub fn builder() -> CompressSpecBuilder {
        CompressSpecBuilder {
            spec: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_quality(self.quality)?;
        if !(10..=100).contains(&self.resize_percent) {
            return Err(PixelDriftError::validation(format!(
                "resize_percent must be 10–100, got {}",
                self.resize_percent
            )));
        }
        for (name, bound) in [("max_width", self.max_width), ("max_height", self.max_height)] {
            if let Some(b) = bound {
                if b < 100 {
                    return Err(PixelDriftError::validation(format!(
                        "{name} must be ≥ 100, got {b}"
                    )));
                }
            }
        }
        if !matches!(
            self.format,
            OutputFormat::Jpeg | OutputFormat::Png | OutputFormat::Webp
        ) {
            return Err(PixelDriftError::validation(format!(
                "compression supports jpeg, png or webp, got {}",
                self.format
            )));
        }
        Ok(())
    }
}

/// Builder for [`CompressSpec`].
#[derive(Debug)]
pub struct CompressSpecBuilder {
    spec: CompressSpec,
}

impl CompressSpecBuilder {
    pub fn quality(mut self, q: u8) -> Self {
        self.spec.quality = q;
        self
    }

    pub fn resize_percent(mut self, pct: u8) -> Self {
        self.spec.resize_percent = pct;
        self
    }

    pub fn max_width(mut self, w: u32) -> Self {
        self.spec.max_width = Some(w);
        self
    }

    pub fn max_height(mut self, h: u32) -> Self {
        self.spec.max_height = Some(h);
        self
    }

    /// Sets the format from a user-facing name (`jpeg`, `jpg`, `png`, `webp`),
    /// keeping the spelling as the output extension.
    pub fn format_name(mut self, name: &str) -> Result<Self> {
        self.spec.format = name.parse()?;
        self.spec.extension = name.trim().to_ascii_lowercase();
        Ok(self)
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.spec.format = format;
        self.spec.extension = format.to_string();
        self
    }

    pub fn keep_metadata(mut self, v: bool) -> Self {
        self.spec.keep_metadata = v;
        self
    }

    pub fn build(self) -> Result<CompressSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

// ── ConvertSpec ──────────────────────────────────────────────────────────

/// Batch format conversion request for [`crate::convert_images`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertSpec {
    pub format: OutputFormat,
    /// Extension used in output names, as spelled by the caller.
    pub extension: String,
    /// Replaces the source base name: `<rename>.<ext>` for one file,
    /// `<rename>_<n>.<ext>` for a batch.
    pub rename_to: Option<String>,
    /// Lossy quality. Default: 90.
    pub quality: u8,
    pub keep_metadata: bool,
}

impl Default for ConvertSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            extension: "png".into(),
            rename_to: None,
            quality: 90,
            keep_metadata: false,
        }
    }
}

impl ConvertSpec {
    pub fn builder() -> ConvertSpecBuilder {
        ConvertSpecBuilder {
            spec: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_quality(self.quality)?;
        if self.extension.is_empty() {
            return Err(PixelDriftError::validation("output extension is empty"));
        }
        if matches!(&self.rename_to, Some(r) if r.trim().is_empty()) {
            return Err(PixelDriftError::validation("rename_to must not be blank"));
        }
        Ok(())
    }
}

/// Builder for [`ConvertSpec`].
#[derive(Debug)]
pub struct ConvertSpecBuilder {
    spec: ConvertSpec,
}

impl ConvertSpecBuilder {
    pub fn format_name(mut self, name: &str) -> Result<Self> {
        self.spec.format = name.parse()?;
        self.spec.extension = name.trim().to_ascii_lowercase();
        Ok(self)
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.spec.format = format;
        self.spec.extension = format.extension().to_string();
        self
    }

    pub fn rename_to(mut self, base: impl Into<String>) -> Self {
        self.spec.rename_to = Some(base.into());
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.spec.quality = q;
        self
    }

    pub fn keep_metadata(mut self, v: bool) -> Self {
        self.spec.keep_metadata = v;
        self
    }

    pub fn build(self) -> Result<ConvertSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

// ── PageLayoutSpec ───────────────────────────────────────────────────────

/// Image → PDF layout request for [`crate::images_to_pdf`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayoutSpec {
    /// Default: A4.
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Margin on every side, in points. Default: 10.
    pub margin: u32,
    /// Default: white.
    pub background: Background,
    pub fit_mode: FitMode,
    /// Pixel density of the page canvases, 72–300. Default: 72.
    pub dpi: u32,
    /// Encode pages as JPEG at this quality; `None` embeds them losslessly.
    pub jpeg_quality: Option<u8>,
}

impl Default for PageLayoutSpec {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: 10,
            background: Background::default(),
            fit_mode: FitMode::Contain,
            dpi: 72,
            jpeg_quality: None,
        }
    }
}

impl PageLayoutSpec {
    pub fn builder() -> PageLayoutSpecBuilder {
        PageLayoutSpecBuilder {
            spec: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_dpi(self.dpi)?;
        if let Some(q) = self.jpeg_quality {
            check_quality(q)?;
            if self.background.is_transparent() {
                return Err(PixelDriftError::validation(
                    "transparent page background cannot be JPEG-encoded",
                ));
            }
        }
        if let Some((w, h)) = self.page_size.points() {
            if self.margin.saturating_mul(2) >= w.min(h) {
                return Err(PixelDriftError::validation(format!(
                    "margin {} leaves no drawable area on a {}x{} pt page",
                    self.margin, w, h
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`PageLayoutSpec`].
#[derive(Debug)]
pub struct PageLayoutSpecBuilder {
    spec: PageLayoutSpec,
}

impl PageLayoutSpecBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.spec.page_size = size;
        self
    }

    pub fn orientation(mut self, o: Orientation) -> Self {
        self.spec.orientation = o;
        self
    }

    pub fn margin(mut self, points: u32) -> Self {
        self.spec.margin = points;
        self
    }

    pub fn background(mut self, bg: Background) -> Self {
        self.spec.background = bg;
        self
    }

    pub fn fit_mode(mut self, mode: FitMode) -> Self {
        self.spec.fit_mode = mode;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.spec.dpi = dpi;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.spec.jpeg_quality = Some(q);
        self
    }

    pub fn build(self) -> Result<PageLayoutSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

// ── RasterCompressSpec ───────────────────────────────────────────────────

/// PDF rasterising compression request for [`crate::compress_pdf`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterCompressSpec {
    /// Page-range expression. Default: `"all"`.
    pub pages: String,
    /// Keep only the first N selected pages.
    pub max_pages: Option<usize>,
    /// Render resolution, 72–300. Default: 120.
    pub dpi: u32,
    /// JPEG quality, 1–100. Default: 60.
    pub quality: u8,
    pub grayscale: bool,
    /// Copy the source document info dictionary. Default: false.
    pub keep_metadata: bool,
}

impl Default for RasterCompressSpec {
    fn default() -> Self {
        Self {
            pages: "all".into(),
            max_pages: None,
            dpi: 120,
            quality: 60,
            grayscale: false,
            keep_metadata: false,
        }
    }
}

impl RasterCompressSpec {
    pub fn builder() -> RasterCompressSpecBuilder {
        RasterCompressSpecBuilder {
            spec: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_dpi(self.dpi)?;
        check_quality(self.quality)?;
        if self.max_pages == Some(0) {
            return Err(PixelDriftError::validation("max_pages must be ≥ 1"));
        }
        if self.pages.trim().is_empty() {
            return Err(PixelDriftError::validation("page expression is empty"));
        }
        Ok(())
    }

    /// Render zoom relative to the 72-unit PDF user space.
    pub fn zoom(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Builder for [`RasterCompressSpec`].
#[derive(Debug)]
pub struct RasterCompressSpecBuilder {
    spec: RasterCompressSpec,
}

impl RasterCompressSpecBuilder {
    pub fn pages(mut self, expr: impl Into<String>) -> Self {
        self.spec.pages = expr.into();
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.spec.max_pages = Some(n);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.spec.dpi = dpi;
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.spec.quality = q;
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.spec.grayscale = v;
        self
    }

    pub fn keep_metadata(mut self, v: bool) -> Self {
        self.spec.keep_metadata = v;
        self
    }

    pub fn build(self) -> Result<RasterCompressSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults() {
        let c = EngineConfig::builder().build().unwrap();
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn engine_concurrency_floor() {
        let c = EngineConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn format_aliases() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert!("gif".parse::<OutputFormat>().unwrap_err().is_validation_error());
    }

    #[test]
    fn background_parsing() {
        assert_eq!(
            "#fff".parse::<Background>().unwrap(),
            Background::Color([255, 255, 255])
        );
        assert_eq!(
            "#102030".parse::<Background>().unwrap(),
            Background::Color([0x10, 0x20, 0x30])
        );
        assert_eq!(
            "Transparent".parse::<Background>().unwrap(),
            Background::Transparent
        );
        assert!("#12345".parse::<Background>().is_err());
        assert!("#gggggg".parse::<Background>().is_err());
    }

    #[test]
    fn transform_requires_one_sizing_shape() {
        assert!(TransformSpec::builder().build().is_err());
        assert!(TransformSpec::builder()
            .percentage(50.0)
            .width(10)
            .build()
            .is_err());
        assert!(TransformSpec::builder().width(0).build().is_err());
        assert!(TransformSpec::builder().width(10).height(20).build().is_ok());
    }

    #[test]
    fn transparent_pad_needs_alpha_format() {
        let err = TransformSpec::builder()
            .width(10)
            .height(10)
            .mode(ResizeMode::Pad)
            .background(Background::Transparent)
            .build()
            .unwrap_err();
        assert!(err.is_validation_error());

        assert!(TransformSpec::builder()
            .width(10)
            .height(10)
            .mode(ResizeMode::Pad)
            .format(OutputFormat::Png)
            .background(Background::Transparent)
            .build()
            .is_ok());
    }

    #[test]
    fn layout_margin_must_leave_area() {
        let err = PageLayoutSpec::builder().margin(298).build().unwrap_err();
        assert!(err.to_string().contains("drawable"));
        assert!(PageLayoutSpec::builder().margin(100).build().is_ok());
    }

    #[test]
    fn layout_huge_margin_is_rejected_not_wrapped() {
        for margin in [u32::MAX / 2 + 1, u32::MAX] {
            let err = PageLayoutSpec::builder().margin(margin).build().unwrap_err();
            assert!(err.is_validation_error(), "margin {margin}");
        }
    }

    #[test]
    fn layout_dpi_range() {
        assert!(PageLayoutSpec::builder().dpi(71).build().is_err());
        assert!(PageLayoutSpec::builder().dpi(301).build().is_err());
        assert!(PageLayoutSpec::builder().dpi(300).build().is_ok());
    }

    #[test]
    fn compress_spec_bounds() {
        assert!(CompressSpec::builder().resize_percent(5).build().is_err());
        assert!(CompressSpec::builder().max_width(50).build().is_err());
        let spec = CompressSpec::builder()
            .format_name("jpg")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(spec.extension, "jpg");
        assert!(CompressSpec::builder()
            .format(OutputFormat::Bmp)
            .build()
            .is_err());
    }

    #[test]
    fn raster_zoom() {
        let spec = RasterCompressSpec::builder().dpi(144).build().unwrap();
        assert!((spec.zoom() - 2.0).abs() < f32::EPSILON);
    }
}
