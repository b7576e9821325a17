//! Public operations.
//!
//! Every operation takes raw assets plus a typed spec, does its CPU work on
//! the blocking pool, and returns finished [`OutputArtifact`]s.
//!
//! Batch operations run items concurrently (bounded by
//! [`EngineConfig::concurrency`]) and are all-or-nothing: the first failing
//! item aborts the batch, remaining in-flight items are abandoned, and no
//! archive is produced. Successful outputs are put back in input order
//! before packaging, whatever order they completed in.
//!
//! Per image the stages always run in the same order:
//!
//! ```text
//! decode ──▶ normalise orientation ──▶ transform ──▶ strip metadata ──▶ encode
//! ```

use crate::asset::InputAsset;
use crate::config::{
    CompressSpec, ConvertSpec, EngineConfig, PageLayoutSpec, RasterCompressSpec, TransformSpec,
};
use crate::error::{PixelDriftError, Result};
use crate::output::{BatchResult, DocumentInfo, OutputArtifact, MIME_PDF};
use crate::package::package;
use crate::pipeline::decode::{decode_image, normalize_orientation, RasterImage};
use crate::pipeline::document::{DocumentSink, PageImage, PdfAssembler, Rect};
use crate::pipeline::encode::{encode_image, encode_jpeg};
use crate::pipeline::layout::layout_page;
use crate::pipeline::params::build_encoder_config;
use crate::pipeline::range::parse_pages;
use crate::pipeline::rasterize::recompress_document;
use crate::pipeline::render::{bind_pdfium, PdfiumDocument};
use crate::pipeline::structure::{load_pdf, page_ids, read_info, PageCopier};
use crate::pipeline::transform::{apply_compress_resize, apply_transform};
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const RESIZE_ARCHIVE: &str = "resized-images.zip";
pub const CONVERT_ARCHIVE: &str = "converted_images.zip";
pub const IMAGES_TO_PDF_NAME: &str = "images_to_pdf.pdf";
pub const COMPRESSED_PDF_NAME: &str = "compressed.pdf";
pub const EXTRACTED_PDF_NAME: &str = "extracted_pages.pdf";
pub const MERGED_PDF_NAME: &str = "merged.pdf";

// ── Image operations ─────────────────────────────────────────────────────

/// Resize, sharpen and re-encode every asset.
///
/// Outputs are named `<base>-resized.<ext>`; two or more are zipped into
/// `resized-images.zip`.
pub async fn resize_images(
    assets: Vec<InputAsset>,
    spec: &TransformSpec,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    spec.validate()?;
    let batch = resize_batch(assets, spec, config).await?;
    package(batch.into_artifacts(), RESIZE_ARCHIVE)
}

/// [`resize_images`] without the packaging step.
pub async fn resize_batch(
    assets: Vec<InputAsset>,
    spec: &TransformSpec,
    config: &EngineConfig,
) -> Result<BatchResult> {
    spec.validate()?;
    let spec = spec.clone();
    let max_bytes = config.max_input_bytes;

    let artifacts = run_batch(assets, config, "resize", move |_, asset| {
        let image = decode_and_orient(&asset, max_bytes)?;
        let image = apply_transform(image, &spec)?;
        let encoder = build_encoder_config(spec.format, spec.quality, spec.keep_metadata)?;
        let bytes = encode_image(&strip_unless(image, spec.keep_metadata), &encoder, &asset.name)?;
        Ok(OutputArtifact::new(
            format!("{}-resized.{}", asset.base_name(), spec.format.extension()),
            spec.format.mime_type(),
            bytes,
        ))
    })
    .await?;
    Ok(BatchResult::new(artifacts))
}

/// Re-encode every asset in another format.
///
/// Names are `<base>_converted.<ext>`, or `<rename>.<ext>` for a single
/// asset and `<rename>_<n>.<ext>` (1-based) for a batch when
/// [`ConvertSpec::rename_to`] is set. Batches are zipped into
/// `converted_images.zip`.
pub async fn convert_images(
    assets: Vec<InputAsset>,
    spec: &ConvertSpec,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    spec.validate()?;
    let single = assets.len() == 1;
    let spec = spec.clone();
    let max_bytes = config.max_input_bytes;

    let artifacts = run_batch(assets, config, "convert", move |index, asset| {
        let image = decode_and_orient(&asset, max_bytes)?;
        let encoder = build_encoder_config(spec.format, spec.quality, spec.keep_metadata)?;
        let bytes = encode_image(&strip_unless(image, spec.keep_metadata), &encoder, &asset.name)?;
        let base = match &spec.rename_to {
            Some(name) if single => name.clone(),
            Some(name) => format!("{}_{}", name, index + 1),
            None => format!("{}_converted", asset.base_name()),
        };
        Ok(OutputArtifact::new(
            format!("{}.{}", base, spec.extension),
            spec.format.mime_type(),
            bytes,
        ))
    })
    .await?;
    package(artifacts, CONVERT_ARCHIVE)
}

/// Compress one image: optional downscale, then re-encode at `spec.quality`.
///
/// The output is named `compressed.<ext>`.
pub async fn compress_image(
    asset: InputAsset,
    spec: &CompressSpec,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    spec.validate()?;
    let spec = spec.clone();
    let max_bytes = config.max_input_bytes;
    let input_len = asset.bytes.len();

    let artifact = blocking("compress", move || {
        let image = decode_and_orient(&asset, max_bytes)?;
        let image = apply_compress_resize(image, &spec)?;
        let encoder = build_encoder_config(spec.format, spec.quality, spec.keep_metadata)?;
        let bytes = encode_image(&strip_unless(image, spec.keep_metadata), &encoder, &asset.name)?;
        Ok(OutputArtifact::new(
            format!("compressed.{}", spec.extension),
            spec.format.mime_type(),
            bytes,
        ))
    })
    .await?;

    info!(
        "Compressed {} → {} bytes ({:.1}%)",
        input_len,
        artifact.len(),
        100.0 * artifact.len() as f64 / input_len.max(1) as f64
    );
    Ok(artifact)
}

// ── Document operations ──────────────────────────────────────────────────

/// One laid-out page, encoded and ready to embed.
struct LaidOutPage {
    image: PageImage,
    width_pt: f32,
    height_pt: f32,
}

/// Place each image on its own page and assemble `images_to_pdf.pdf`.
///
/// Page order is input order.
pub async fn images_to_pdf(
    assets: Vec<InputAsset>,
    spec: &PageLayoutSpec,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    spec.validate()?;
    let layout = spec.clone();
    let max_bytes = config.max_input_bytes;

    let pages = run_batch(assets, config, "layout", move |_, asset| {
        let image = decode_and_orient(&asset, max_bytes)?;
        let canvas = layout_page(&image, &layout)?;
        let image = match layout.jpeg_quality {
            Some(q) => PageImage::Jpeg {
                gray: false,
                width: canvas.pixels.width(),
                height: canvas.pixels.height(),
                data: encode_jpeg(&canvas.pixels, q, &asset.name)?,
            },
            None => PageImage::Raw(canvas.pixels),
        };
        Ok(LaidOutPage {
            image,
            width_pt: canvas.width_pt,
            height_pt: canvas.height_pt,
        })
    })
    .await?;

    let bytes = blocking("assemble", move || {
        let mut pdf = PdfAssembler::new();
        for page in pages {
            let handle = pdf.new_page(page.width_pt, page.height_pt)?;
            let rect = Rect::page(page.width_pt, page.height_pt);
            pdf.embed_image(handle, page.image, rect)?;
        }
        pdf.finish()
    })
    .await?;

    Ok(OutputArtifact::new(IMAGES_TO_PDF_NAME, MIME_PDF, bytes))
}

/// Rasterise the selected pages of a PDF and rebuild it from JPEGs.
///
/// Requires the pdfium library (see [`EngineConfig::pdfium_library_path`]).
/// The output is named `compressed.pdf`.
pub async fn compress_pdf(
    asset: InputAsset,
    spec: &RasterCompressSpec,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    spec.validate()?;
    asset.check_size(config.max_input_bytes)?;
    let spec = spec.clone();
    let library = config.pdfium_library_path.clone();
    let progress = progress_of(config);
    let input_len = asset.bytes.len();

    let bytes = blocking("rasterise", move || {
        let pdfium = bind_pdfium(library.as_deref())?;
        let source = PdfiumDocument::load(&pdfium, &asset.bytes, &asset.name)?;
        recompress_document(&source, PdfAssembler::new(), &spec, &*progress)
    })
    .await?;

    info!(
        "PDF recompressed: {} → {} bytes ({:.1}%)",
        input_len,
        bytes.len(),
        100.0 * bytes.len() as f64 / input_len.max(1) as f64
    );
    Ok(OutputArtifact::new(COMPRESSED_PDF_NAME, MIME_PDF, bytes))
}

/// Copy the pages named by `pages` (e.g. `"1-3,6"`, `"all"`) into a new PDF.
///
/// Repeated pages are copied each time they appear. The output is named
/// `extracted_pages.pdf`.
pub async fn extract_pages(
    asset: InputAsset,
    pages: &str,
    config: &EngineConfig,
) -> Result<OutputArtifact> {
    asset.check_size(config.max_input_bytes)?;
    let expr = pages.to_string();

    let bytes = blocking("extract", move || {
        let source = load_pdf(&asset.bytes, &asset.name)?;
        let ids = page_ids(&source);
        let selected: Vec<_> = parse_pages(&expr, ids.len())?
            .into_iter()
            .map(|i| ids[i])
            .collect();
        debug!("Extracting {} pages from '{}'", selected.len(), asset.name);

        let mut copier = PageCopier::new();
        copier.append(&source, &selected)?;
        copier.finish()
    })
    .await?;

    Ok(OutputArtifact::new(EXTRACTED_PDF_NAME, MIME_PDF, bytes))
}

/// Append every page of every document, in input order, into `merged.pdf`.
pub async fn merge_pdfs(assets: Vec<InputAsset>, config: &EngineConfig) -> Result<OutputArtifact> {
    if assets.is_empty() {
        return Err(PixelDriftError::validation("no documents to merge"));
    }
    for asset in &assets {
        asset.check_size(config.max_input_bytes)?;
    }

    let bytes = blocking("merge", move || {
        let mut copier = PageCopier::new();
        for asset in &assets {
            let source = load_pdf(&asset.bytes, &asset.name)?;
            copier.append(&source, &page_ids(&source))?;
        }
        info!(
            "Merged {} documents into {} pages",
            assets.len(),
            copier.page_count()
        );
        copier.finish()
    })
    .await?;

    Ok(OutputArtifact::new(MERGED_PDF_NAME, MIME_PDF, bytes))
}

/// Read document information without rendering.
pub async fn inspect_pdf(asset: InputAsset, config: &EngineConfig) -> Result<DocumentInfo> {
    asset.check_size(config.max_input_bytes)?;
    blocking("inspect", move || {
        let doc = load_pdf(&asset.bytes, &asset.name)?;
        Ok(read_info(&doc))
    })
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Size of an item's output, for progress reporting.
trait BatchOutput: Send + 'static {
    fn output_len(&self) -> usize;
}

impl BatchOutput for OutputArtifact {
    fn output_len(&self) -> usize {
        self.len()
    }
}

impl BatchOutput for LaidOutPage {
    fn output_len(&self) -> usize {
        match &self.image {
            PageImage::Jpeg { data, .. } => data.len(),
            PageImage::Raw(img) => img.as_bytes().len(),
        }
    }
}

/// Run `work` over every asset, at most `config.concurrency` at a time.
///
/// Returns outputs in input order, or the first error.
async fn run_batch<T, F>(
    assets: Vec<InputAsset>,
    config: &EngineConfig,
    op: &'static str,
    work: F,
) -> Result<Vec<T>>
where
    T: BatchOutput,
    F: Fn(usize, InputAsset) -> Result<T> + Send + Sync + 'static,
{
    if assets.is_empty() {
        return Err(PixelDriftError::validation("no input assets"));
    }

    let start = Instant::now();
    let total = assets.len();
    let work = Arc::new(work);
    let progress = progress_of(config);
    info!("{}: {} items, concurrency {}", op, total, config.concurrency);
    progress.on_batch_start(total);

    let result: Result<Vec<(usize, T)>> = stream::iter(assets.into_iter().enumerate().map(
        |(index, asset)| {
            let work = Arc::clone(&work);
            let progress = Arc::clone(&progress);
            async move {
                progress.on_item_start(index, total, &asset.name);
                let name = asset.name.clone();
                let outcome = blocking(op, move || work(index, asset)).await;
                match &outcome {
                    Ok(out) => progress.on_item_complete(index, total, out.output_len()),
                    Err(e) => {
                        debug!("{}: '{}' failed: {}", op, name, e);
                        progress.on_item_error(index, total, &e.to_string());
                    }
                }
                outcome.map(|out| (index, out))
            }
        },
    ))
    .buffer_unordered(config.concurrency.max(1))
    .try_collect()
    .await;

    match result {
        Ok(mut done) => {
            done.sort_by_key(|(index, _)| *index);
            progress.on_batch_complete(total, total);
            info!(
                "{}: {} items in {}ms",
                op,
                total,
                start.elapsed().as_millis()
            );
            Ok(done.into_iter().map(|(_, out)| out).collect())
        }
        Err(e) => {
            progress.on_batch_complete(total, 0);
            Err(e)
        }
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(op: &'static str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PixelDriftError::Internal(format!("{} task panicked: {}", op, e)))?
}

fn progress_of(config: &EngineConfig) -> Arc<dyn BatchProgressCallback> {
    config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback))
}

fn decode_and_orient(asset: &InputAsset, max_bytes: usize) -> Result<RasterImage> {
    let image = decode_image(asset, max_bytes)?;
    Ok(normalize_orientation(image, &asset.bytes))
}

fn strip_unless(mut image: RasterImage, keep_metadata: bool) -> RasterImage {
    if !keep_metadata {
        image.metadata.strip();
    }
    image
}
