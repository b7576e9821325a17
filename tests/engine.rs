//! Integration tests for the public operations.
//!
//! Images are generated in memory with `image`; PDFs are built by hand with
//! `lopdf` and re-parsed to check the results. `compress_pdf` needs a pdfium
//! library and only runs when `PIXELDRIFT_PDFIUM_TESTS` is set.
//!
//! Run with:
//!   cargo test --test engine
//!   PIXELDRIFT_PDFIUM_TESTS=1 PDFIUM_LIB_PATH=/opt/pdfium cargo test --test engine

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use pixeldrift::{
    compress_image, compress_pdf, convert_images, extract_pages, images_to_pdf, inspect_pdf,
    merge_pdfs, resize_images, BatchProgressCallback, CompressSpec, ConvertSpec, EngineConfig,
    InputAsset, OutputFormat, PageLayoutSpec, PageSize, PixelDriftError, RasterCompressSpec,
    TransformSpec,
};
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────

fn png(name: &str, w: u32, h: u32) -> InputAsset {
    let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    InputAsset::new(name, buf)
}

fn dims(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

fn zip_members(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut f = archive.by_index(i).unwrap();
            let mut buf = Vec::new();
            f.read_to_end(&mut buf).unwrap();
            (f.name().to_string(), buf)
        })
        .collect()
}

/// A document whose page `n` draws the text `<label> n`.
fn pdf(name: &str, label: &str, pages: usize) -> InputAsset {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = format!("BT 72 720 Td ({label} {n}) Tj ET");
            let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
            }))
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(format!("{label} report")),
        "Author" => Object::string_literal("QA"),
    });
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    InputAsset::new(name, buf)
}

fn markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let text = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned();
            let start = text.find('(').unwrap() + 1;
            let end = text.find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, e: String) {
        self.events.lock().unwrap().push(e);
    }
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl BatchProgressCallback for Recorder {
    fn on_batch_start(&self, total: usize) {
        self.push(format!("start {total}"));
    }
    fn on_item_error(&self, index: usize, _total: usize, _error: &str) {
        self.push(format!("error {index}"));
    }
    fn on_item_complete(&self, index: usize, _total: usize, _bytes: usize) {
        self.push(format!("done {index}"));
    }
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        self.push(format!("complete {succeeded}/{total}"));
    }
}

fn config_with(recorder: &Arc<Recorder>) -> EngineConfig {
    EngineConfig::builder()
        .concurrency(3)
        .progress_callback(recorder.clone() as Arc<dyn BatchProgressCallback>)
        .build()
        .unwrap()
}

// ── Resize ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn resize_single_image_is_returned_unzipped() {
    let spec = TransformSpec::builder().width(50).build().unwrap();
    let out = resize_images(vec![png("cat.png", 100, 50)], &spec, &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.filename(), "cat-resized.jpg");
    assert_eq!(out.mime_type(), "image/jpeg");
    assert_eq!(dims(out.bytes()), (50, 25));
}

#[tokio::test]
async fn resize_batch_zips_in_input_order_with_unique_names() {
    let spec = TransformSpec::builder()
        .width(40)
        .height(40)
        .mode(pixeldrift::ResizeMode::Pad)
        .format(OutputFormat::Png)
        .build()
        .unwrap();
    let assets = vec![
        png("a.png", 400, 100),
        png("b.png", 100, 400),
        png("a.png", 80, 80),
        png("c.png", 60, 120),
        png("d.png", 50, 50),
    ];
    let out = resize_images(assets, &spec, &EngineConfig::default())
        .await
        .unwrap();

    assert_eq!(out.filename(), "resized-images.zip");
    let members = zip_members(out.bytes());
    let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "a-resized.png",
            "b-resized.png",
            "a-resized_2.png",
            "c-resized.png",
            "d-resized.png",
        ]
    );
    for (_, bytes) in &members {
        assert_eq!(dims(bytes), (40, 40));
    }
}

#[tokio::test]
async fn one_corrupt_item_fails_the_whole_batch() {
    let recorder = Arc::new(Recorder::default());
    let spec = TransformSpec::builder().percentage(50.0).build().unwrap();
    let assets = vec![
        png("1.png", 20, 20),
        png("2.png", 20, 20),
        InputAsset::new("broken.png", b"\x89PNG not really".to_vec()),
        png("4.png", 20, 20),
        png("5.png", 20, 20),
    ];

    let err = resize_images(assets, &spec, &config_with(&recorder))
        .await
        .unwrap_err();
    match err {
        PixelDriftError::Decode { item, .. } => assert_eq!(item, "broken.png"),
        other => panic!("expected Decode, got {other:?}"),
    }
    let events = recorder.events();
    assert_eq!(events.first().map(String::as_str), Some("start 5"));
    assert!(events.contains(&"error 2".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("complete 0/5"));
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let spec = TransformSpec::builder().width(10).build().unwrap();
    let err = resize_images(vec![], &spec, &EngineConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn oversized_input_is_rejected_before_decoding() {
    let config = EngineConfig::builder().max_input_bytes(16).build().unwrap();
    let spec = TransformSpec::builder().width(10).build().unwrap();
    let err = resize_images(vec![png("big.png", 64, 64)], &spec, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PixelDriftError::ResourceLimit { limit: 16, .. }));
}

// ── Convert / compress ───────────────────────────────────────────────────

#[tokio::test]
async fn convert_naming() {
    let config = EngineConfig::default();

    let spec = ConvertSpec::builder().format_name("jpg").unwrap().build().unwrap();
    let out = convert_images(vec![png("scan.png", 10, 10)], &spec, &config)
        .await
        .unwrap();
    assert_eq!(out.filename(), "scan_converted.jpg");
    assert_eq!(out.mime_type(), "image/jpeg");

    let spec = ConvertSpec::builder()
        .format(OutputFormat::Webp)
        .rename_to("holiday")
        .build()
        .unwrap();
    let single = convert_images(vec![png("x.png", 10, 10)], &spec, &config)
        .await
        .unwrap();
    assert_eq!(single.filename(), "holiday.webp");

    let batch = convert_images(
        vec![png("x.png", 10, 10), png("y.png", 12, 12)],
        &spec,
        &config,
    )
    .await
    .unwrap();
    assert_eq!(batch.filename(), "converted_images.zip");
    let names: Vec<String> = zip_members(batch.bytes()).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["holiday_1.webp", "holiday_2.webp"]);
}

#[tokio::test]
async fn compress_image_bounds_and_names_output() {
    let spec = CompressSpec::builder()
        .quality(50)
        .max_width(200)
        .build()
        .unwrap();
    let out = compress_image(png("wide.png", 800, 400), &spec, &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.filename(), "compressed.jpeg");
    assert_eq!(dims(out.bytes()), (200, 100));
}

// ── Images → PDF ─────────────────────────────────────────────────────────

#[tokio::test]
async fn images_to_pdf_one_page_per_image_in_order() {
    let spec = PageLayoutSpec::builder()
        .page_size(PageSize::A4)
        .jpeg_quality(80)
        .build()
        .unwrap();
    let assets = vec![png("p1.png", 300, 200), png("p2.png", 200, 300), png("p3.png", 50, 50)];
    let out = images_to_pdf(assets, &spec, &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.filename(), "images_to_pdf.pdf");
    assert_eq!(out.mime_type(), "application/pdf");

    let doc = Document::load_mem(out.bytes()).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    for id in pages.values() {
        let mb = doc.get_dictionary(*id).unwrap().get(b"MediaBox").unwrap();
        let mb: Vec<f32> = mb
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect();
        assert_eq!(mb, vec![0.0, 0.0, 595.0, 842.0]);
    }
}

// ── Structural PDF operations ────────────────────────────────────────────

#[tokio::test]
async fn extract_pages_keeps_order_and_repeats() {
    let out = extract_pages(pdf("in.pdf", "p", 6), "5,1-2,5", &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.filename(), "extracted_pages.pdf");
    assert_eq!(markers(out.bytes()), vec!["p 5", "p 1", "p 2", "p 5"]);
}

#[tokio::test]
async fn extract_pages_out_of_range_is_a_range_error() {
    let err = extract_pages(pdf("in.pdf", "p", 3), "2-4", &EngineConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_range_error());
}

#[tokio::test]
async fn merge_appends_documents_in_order() {
    let out = merge_pdfs(
        vec![pdf("a.pdf", "a", 2), pdf("b.pdf", "b", 1), pdf("c.pdf", "c", 2)],
        &EngineConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(out.filename(), "merged.pdf");
    assert_eq!(markers(out.bytes()), vec!["a 1", "a 2", "b 1", "c 1", "c 2"]);
}

#[tokio::test]
async fn merge_names_the_corrupt_document() {
    let err = merge_pdfs(
        vec![pdf("a.pdf", "a", 1), InputAsset::new("junk.pdf", b"%PDF-1.4 garbage".to_vec())],
        &EngineConfig::default(),
    )
    .await
    .unwrap_err();
    match err {
        PixelDriftError::CorruptPdf { item, .. } => assert_eq!(item, "junk.pdf"),
        other => panic!("expected CorruptPdf, got {other:?}"),
    }
}

#[tokio::test]
async fn inspect_reads_info_and_page_count() {
    let info = inspect_pdf(pdf("r.pdf", "Quarterly", 4), &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(info.page_count, 4);
    assert_eq!(info.title.as_deref(), Some("Quarterly report"));
    assert_eq!(info.author.as_deref(), Some("QA"));
    assert_eq!(info.pdf_version, "1.7");
}

#[tokio::test]
async fn artifacts_are_written_to_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let out = merge_pdfs(vec![pdf("a.pdf", "a", 1)], &EngineConfig::default())
        .await
        .unwrap();
    let path = out.write_to(tmp.path()).await.unwrap();
    assert_eq!(path, tmp.path().join("merged.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), out.bytes());
}

// ── Rasterising compression (needs pdfium) ───────────────────────────────

#[tokio::test]
async fn compress_pdf_with_pdfium() {
    if std::env::var("PIXELDRIFT_PDFIUM_TESTS").is_err() {
        println!("SKIP: set PIXELDRIFT_PDFIUM_TESTS=1 to run pdfium tests");
        return;
    }
    let spec = RasterCompressSpec::builder()
        .dpi(72)
        .max_pages(2)
        .grayscale(true)
        .build()
        .unwrap();
    let out = compress_pdf(pdf("in.pdf", "p", 3), &spec, &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.filename(), "compressed.pdf");
    let doc = Document::load_mem(out.bytes()).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}
