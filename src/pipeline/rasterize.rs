//! Rasterising recompression: every selected page becomes one JPEG.
//!
//! ```text
//! RasterSource ──render(zoom)──▶ bitmap ──[desaturate]──▶ JPEG ──▶ DocumentSink
//! ```
//!
//! The new page is sized to the bitmap's pixel dimensions, one point per
//! pixel. Text and vector content are flattened into the image.

use crate::config::{OutputFormat, RasterCompressSpec};
use crate::error::Result;
use crate::pipeline::decode::RasterImage;
use crate::pipeline::document::{DocumentSink, PageImage, Rect};
use crate::pipeline::encode::{desaturate, encode_image, flatten_onto};
use crate::pipeline::params::{build_encoder_config, EncoderConfig};
use crate::pipeline::range::parse_pages;
use crate::pipeline::render::RasterSource;
use crate::progress::BatchProgressCallback;
use image::DynamicImage;
use tracing::{debug, info};

/// Pages selected by `spec`: the page expression, then the `max_pages` cap.
pub fn select_pages(spec: &RasterCompressSpec, page_count: usize) -> Result<Vec<usize>> {
    let mut pages = parse_pages(&spec.pages, page_count)?;
    if let Some(cap) = spec.max_pages {
        pages.truncate(cap);
    }
    Ok(pages)
}

/// Re-render the selected pages of `source` into `sink` and serialise it.
///
/// Any page failure aborts the whole document; `sink` is dropped unfinished.
pub fn recompress_document<S, D>(
    source: &S,
    mut sink: D,
    spec: &RasterCompressSpec,
    progress: &dyn BatchProgressCallback,
) -> Result<Vec<u8>>
where
    S: RasterSource + ?Sized,
    D: DocumentSink,
{
    spec.validate()?;
    let pages = select_pages(spec, source.page_count())?;
    let zoom = spec.zoom();
    let encoder = build_encoder_config(OutputFormat::Jpeg, spec.quality, false)?;
    let total = pages.len();
    info!(
        "Rasterising {} of {} pages at {} DPI (zoom {:.3}), quality {}{}",
        total,
        source.page_count(),
        spec.dpi,
        zoom,
        spec.quality,
        if spec.grayscale { ", grayscale" } else { "" }
    );

    progress.on_batch_start(total);
    for (i, &index) in pages.iter().enumerate() {
        let name = format!("page {}", index + 1);
        progress.on_item_start(i, total, &name);

        let embedded = render_one(source, index, zoom, spec.grayscale, &encoder, &name)
            .and_then(|(image, rect)| {
                let bytes = image_len(&image);
                let page = sink.new_page(rect.width, rect.height)?;
                sink.embed_image(page, image, rect)?;
                Ok(bytes)
            });
        match embedded {
            Ok(bytes) => progress.on_item_complete(i, total, bytes),
            Err(e) => {
                progress.on_item_error(i, total, &e.to_string());
                progress.on_batch_complete(total, i);
                return Err(e);
            }
        }
    }

    if spec.keep_metadata {
        sink.set_info(&source.info())?;
    }
    let out = sink.finish()?;
    progress.on_batch_complete(total, total);
    Ok(out)
}

fn render_one<S: RasterSource + ?Sized>(
    source: &S,
    index: usize,
    zoom: f32,
    grayscale: bool,
    encoder: &EncoderConfig,
    name: &str,
) -> Result<(PageImage, Rect)> {
    let bitmap = source.render_page(index, zoom)?;
    let (width, height) = (bitmap.width(), bitmap.height());

    let pixels = if grayscale {
        DynamicImage::ImageLuma8(desaturate(&bitmap))
    } else if bitmap.color().has_alpha() {
        flatten_onto(&bitmap, [255, 255, 255])
    } else {
        DynamicImage::ImageRgb8(bitmap.to_rgb8())
    };
    let data = encode_image(&RasterImage::new(pixels), encoder, name)?;
    debug!("{}: {}x{} px → {} bytes", name, width, height, data.len());

    Ok((
        PageImage::Jpeg {
            data,
            width,
            height,
            gray: grayscale,
        },
        Rect::page(width as f32, height as f32),
    ))
}

fn image_len(image: &PageImage) -> usize {
    match image {
        PageImage::Jpeg { data, .. } => data.len(),
        PageImage::Raw(img) => img.as_bytes().len(),
    }
}
