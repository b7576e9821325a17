//! CLI binary for pixeldrift.
//!
//! A thin shim over the library crate: reads files into `InputAsset`s, maps
//! flags to request specs, runs one operation and writes its artifact.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use pixeldrift::{
    compress_image, compress_pdf, convert_images, extract_pages, images_to_pdf, inspect_pdf,
    merge_pdfs, resize_images, Background, BatchProgressCallback, CompressSpec, ConvertSpec,
    DocumentInfo, EngineConfig, FitMode, InputAsset, Orientation, OutputArtifact, OutputFormat,
    PageLayoutSpec, PageSize, PixelDriftError, ProgressCallback, RasterCompressSpec, ResizeMode,
    TransformSpec,
};
use regex::Regex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────

/// Live progress bar plus one log line per finished item. Items may finish
/// out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, (Instant, String)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} items  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }

    /// Elapsed seconds and name recorded by `on_item_start`.
    fn finish_item(&self, index: usize) -> (f64, String) {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|(t, name)| (t.elapsed().as_secs_f64(), name))
            .unwrap_or((0.0, format!("#{}", index + 1)))
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
    }

    fn on_item_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, (Instant::now(), name.to_string()));
        }
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, bytes: usize) {
        let (secs, name) = self.finish_item(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{bytes:>9} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let (secs, name) = self.finish_item(index);
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        if succeeded == total && self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!("{} {} items processed", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} batch aborted after {} error(s)",
                red("✘"),
                red(&self.errors.load(Ordering::SeqCst).max(1).to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Resize to 800px wide, keep aspect, write WebP
  pixeldrift resize --width 800 --format webp photos/*.jpg

  # Cover-crop to a 512x512 thumbnail
  pixeldrift resize --width 512 --height 512 --mode cover avatar.png

  # Convert a batch to PNG with sequential names (zip archive)
  pixeldrift convert --format png --rename-to scan *.tiff

  # Compress one photo to quality 60 and at most 1600px wide
  pixeldrift compress --quality 60 --max-width 1600 big.jpg

  # Images to an A4 landscape PDF with JPEG pages
  pixeldrift img2pdf --page-size a4 --orientation landscape --jpeg-quality 85 *.png

  # Shrink a scanned PDF: first 20 pages, 100 DPI, grayscale
  pixeldrift compress-pdf --max-pages 20 --dpi 100 --grayscale scan.pdf

  # Split and merge
  pixeldrift split --pages 1-3,7 report.pdf
  pixeldrift merge a.pdf b.pdf c.pdf

  # Document information as JSON
  pixeldrift --json inspect report.pdf

ENVIRONMENT VARIABLES:
  PIXELDRIFT_OUT_DIR        Output directory (default: current directory)
  PIXELDRIFT_CONCURRENCY    Parallel items in batch operations
  PIXELDRIFT_MAX_INPUT_MB   Per-file input size limit
  PDFIUM_LIB_PATH           pdfium library file or directory (compress-pdf)
  RUST_LOG                  Overrides the log filter
"#;

/// Resize, convert and compress images and PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pixeldrift",
    version,
    about = "Resize, convert and compress images and PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory the result is written to.
    #[arg(short, long, global = true, env = "PIXELDRIFT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Items processed in parallel by batch operations.
    #[arg(short, long, global = true, env = "PIXELDRIFT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-file input size limit in MiB.
    #[arg(long, global = true, env = "PIXELDRIFT_MAX_INPUT_MB", default_value_t = 50)]
    max_input_mb: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PIXELDRIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PIXELDRIFT_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PIXELDRIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Print a JSON summary on stdout instead of human-readable text.
    #[arg(long, global = true, env = "PIXELDRIFT_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resize and sharpen images.
    Resize(ResizeArgs),
    /// Convert images to another format.
    Convert(ConvertArgs),
    /// Compress a single image.
    Compress(CompressArgs),
    /// Lay images out as PDF pages, one image per page.
    #[command(name = "img2pdf")]
    ImagesToPdf(ImagesToPdfArgs),
    /// Rasterise PDF pages and rebuild the document from JPEGs.
    CompressPdf(CompressPdfArgs),
    /// Copy selected pages into a new PDF.
    Split(SplitArgs),
    /// Concatenate PDFs in the order given.
    Merge(MergeArgs),
    /// Print document information.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ResizeArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Uniform scale in percent; excludes --width/--height.
    #[arg(long, conflicts_with_all = ["width", "height"])]
    percentage: Option<f64>,
    /// How width and height are honoured together.
    #[arg(long, value_enum, default_value = "fit")]
    mode: ModeArg,
    /// Let fit mode distort the aspect ratio.
    #[arg(long)]
    no_keep_ratio: bool,
    /// Allow results larger than the source.
    #[arg(long)]
    allow_upscale: bool,
    /// Sharpness factor: 1 unchanged, 0 smooth, above 1 sharper.
    #[arg(long, default_value_t = 1.0)]
    sharpen: f32,
    #[arg(long, value_enum, default_value = "jpeg")]
    format: FormatArg,
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    #[arg(long)]
    keep_metadata: bool,
    /// Pad fill: white, black, transparent, #RGB or #RRGGBB.
    #[arg(long, default_value = "white", value_parser = parse_background)]
    background: Background,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// jpeg, jpg, png, webp, bmp or tiff. Also the output extension.
    #[arg(long, default_value = "png")]
    format: String,
    /// Base name for outputs: NAME.ext, or NAME_1.ext, NAME_2.ext… for a batch.
    #[arg(long)]
    rename_to: Option<String>,
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    #[arg(long)]
    keep_metadata: bool,
}

#[derive(Args, Debug)]
struct CompressArgs {
    file: PathBuf,
    #[arg(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    /// Downscale to this percentage first (10–100).
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(10..=100))]
    resize_percent: u8,
    #[arg(long)]
    max_width: Option<u32>,
    #[arg(long)]
    max_height: Option<u32>,
    /// jpeg, jpg, png or webp.
    #[arg(long, default_value = "jpeg")]
    format: String,
    #[arg(long)]
    keep_metadata: bool,
}

#[derive(Args, Debug)]
struct ImagesToPdfArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageSizeArg,
    #[arg(long, value_enum, default_value = "portrait")]
    orientation: OrientationArg,
    /// Margin in points (1/72 inch).
    #[arg(long, default_value_t = 10)]
    margin: u32,
    #[arg(long, default_value = "white", value_parser = parse_background)]
    background: Background,
    #[arg(long, value_enum, default_value = "contain")]
    fit: FitArg,
    /// Pixel density of the page images.
    #[arg(long, default_value_t = 72, value_parser = clap::value_parser!(u32).range(72..=300))]
    dpi: u32,
    /// Store pages as JPEG at this quality instead of lossless.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: Option<u8>,
}

#[derive(Args, Debug)]
struct CompressPdfArgs {
    file: PathBuf,
    /// Page selection: all, 5, 3-15, or 1,3,5-7.
    #[arg(long, default_value = "all")]
    pages: String,
    /// Keep at most this many of the selected pages.
    #[arg(long)]
    max_pages: Option<usize>,
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u32).range(72..=300))]
    dpi: u32,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    #[arg(long)]
    grayscale: bool,
    #[arg(long)]
    keep_metadata: bool,
    /// pdfium library file or directory.
    #[arg(long, env = "PIXELDRIFT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SplitArgs {
    file: PathBuf,
    /// Pages to keep, in order: all, 5, 3-15, or 1,3,5-7.
    #[arg(long)]
    pages: String,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    file: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Fit,
    Stretch,
    Pad,
    Cover,
}

impl From<ModeArg> for ResizeMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Fit => ResizeMode::Fit,
            ModeArg::Stretch => ResizeMode::Stretch,
            ModeArg::Pad => ResizeMode::Pad,
            ModeArg::Cover => ResizeMode::Cover,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Webp => OutputFormat::Webp,
            FormatArg::Bmp => OutputFormat::Bmp,
            FormatArg::Tiff => OutputFormat::Tiff,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Fit,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A3 => PageSize::A3,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::A5 => PageSize::A5,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
            PageSizeArg::Fit => PageSize::Fit,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FitArg {
    Contain,
    Cover,
}

impl From<FitArg> for FitMode {
    fn from(v: FitArg) -> Self {
        match v {
            FitArg::Contain => FitMode::Contain,
            FitArg::Cover => FitMode::Cover,
        }
    }
}

fn parse_background(s: &str) -> std::result::Result<Background, String> {
    s.parse().map_err(|e: PixelDriftError| e.to_string())
}

impl Command {
    /// Whether the operation reports per-item progress.
    fn reports_progress(&self) -> bool {
        matches!(
            self,
            Command::Resize(_) | Command::Convert(_) | Command::ImagesToPdf(_) | Command::CompressPdf(_)
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && cli.command.reports_progress();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let pdfium_lib = match &cli.command {
        Command::CompressPdf(args) => args.pdfium_lib.clone(),
        _ => None,
    };
    let config = build_config(&cli, progress_cb, pdfium_lib)?;

    // ── Run operation ────────────────────────────────────────────────────
    let started = Instant::now();
    let artifact = match &cli.command {
        Command::Resize(args) => {
            let spec = resize_spec(args)?;
            let assets = read_assets(&args.files).await?;
            resize_images(assets, &spec, &config)
                .await
                .context("Resize failed")?
        }
        Command::Convert(args) => {
            let mut builder = ConvertSpec::builder()
                .format_name(&args.format)
                .context("Invalid --format")?
                .quality(args.quality)
                .keep_metadata(args.keep_metadata);
            if let Some(name) = &args.rename_to {
                builder = builder.rename_to(sanitize_filename(name));
            }
            let spec = builder.build().context("Invalid conversion options")?;
            let assets = read_assets(&args.files).await?;
            convert_images(assets, &spec, &config)
                .await
                .context("Conversion failed")?
        }
        Command::Compress(args) => {
            let mut builder = CompressSpec::builder()
                .format_name(&args.format)
                .context("Invalid --format")?
                .quality(args.quality)
                .resize_percent(args.resize_percent)
                .keep_metadata(args.keep_metadata);
            if let Some(w) = args.max_width {
                builder = builder.max_width(w);
            }
            if let Some(h) = args.max_height {
                builder = builder.max_height(h);
            }
            let spec = builder.build().context("Invalid compression options")?;
            let asset = read_asset(&args.file).await?;
            compress_image(asset, &spec, &config)
                .await
                .context("Compression failed")?
        }
        Command::ImagesToPdf(args) => {
            let mut builder = PageLayoutSpec::builder()
                .page_size(args.page_size.into())
                .orientation(args.orientation.into())
                .margin(args.margin)
                .background(args.background)
                .fit_mode(args.fit.into())
                .dpi(args.dpi);
            if let Some(q) = args.jpeg_quality {
                builder = builder.jpeg_quality(q);
            }
            let spec = builder.build().context("Invalid layout options")?;
            let assets = read_assets(&args.files).await?;
            images_to_pdf(assets, &spec, &config)
                .await
                .context("PDF creation failed")?
        }
        Command::CompressPdf(args) => {
            let mut builder = RasterCompressSpec::builder()
                .pages(args.pages.clone())
                .dpi(args.dpi)
                .quality(args.quality)
                .grayscale(args.grayscale)
                .keep_metadata(args.keep_metadata);
            if let Some(n) = args.max_pages {
                builder = builder.max_pages(n);
            }
            let spec = builder.build().context("Invalid PDF compression options")?;
            let asset = read_asset(&args.file).await?;
            compress_pdf(asset, &spec, &config)
                .await
                .context("PDF compression failed")?
        }
        Command::Split(args) => {
            let asset = read_asset(&args.file).await?;
            extract_pages(asset, &args.pages, &config)
                .await
                .context("Page extraction failed")?
        }
        Command::Merge(args) => {
            let assets = read_assets(&args.files).await?;
            merge_pdfs(assets, &config).await.context("Merge failed")?
        }
        Command::Inspect(args) => {
            let asset = read_asset(&args.file).await?;
            let info = inspect_pdf(asset, &config)
                .await
                .context("Failed to inspect PDF")?;
            print_info(&args.file, &info, cli.json)?;
            return Ok(());
        }
    };

    let path = artifact
        .write_to(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to write {}", artifact.filename()))?;
    report(&cli, &artifact, &path, started.elapsed())
}

/// Map global flags to `EngineConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    pdfium_lib: Option<PathBuf>,
) -> Result<EngineConfig> {
    let mut builder = EngineConfig::builder()
        .concurrency(cli.concurrency)
        .max_input_bytes(cli.max_input_mb.saturating_mul(1024 * 1024));
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(path) = pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }
    builder.build().context("Invalid configuration")
}

fn resize_spec(args: &ResizeArgs) -> Result<TransformSpec> {
    let mut builder = TransformSpec::builder()
        .mode(args.mode.into())
        .keep_ratio(!args.no_keep_ratio)
        .prevent_upscale(!args.allow_upscale)
        .sharpen(args.sharpen)
        .format(args.format.into())
        .quality(args.quality)
        .keep_metadata(args.keep_metadata)
        .background(args.background);
    if let Some(w) = args.width {
        builder = builder.width(w);
    }
    if let Some(h) = args.height {
        builder = builder.height(h);
    }
    if let Some(p) = args.percentage {
        builder = builder.percentage(p);
    }
    builder.build().context("Invalid resize options")
}

// ── File boundary ────────────────────────────────────────────────────────

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

async fn read_asset(path: &Path) -> Result<InputAsset> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| sanitize_filename(&n.to_string_lossy()))
        .unwrap_or_else(|| "input".to_string());
    Ok(InputAsset::new(name, bytes))
}

async fn read_assets(paths: &[PathBuf]) -> Result<Vec<InputAsset>> {
    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        assets.push(read_asset(path).await?);
    }
    Ok(assets)
}

// ── Reporting ────────────────────────────────────────────────────────────

fn report(cli: &Cli, artifact: &OutputArtifact, path: &Path, elapsed: Duration) -> Result<()> {
    if cli.json {
        let summary = serde_json::json!({
            "filename": artifact.filename(),
            "mime_type": artifact.mime_type(),
            "bytes": artifact.len(),
            "path": path.display().to_string(),
            "duration_ms": elapsed.as_millis() as u64,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            cyan(artifact.filename()),
            dim(&format!("{} bytes, {}ms", artifact.len(), elapsed.as_millis())),
            bold(&path.display().to_string()),
        );
    }
    Ok(())
}

fn print_info(file: &Path, info: &DocumentInfo, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(info).context("Failed to serialise metadata")?
        );
        return Ok(());
    }
    println!("File:          {}", file.display());
    println!("Pages:         {}", info.page_count);
    println!("PDF Version:   {}", info.pdf_version);
    for (key, value) in info.entries() {
        println!("{:<14} {}", format!("{key}:"), value);
    }
    Ok(())
}
