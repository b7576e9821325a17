//! Building new PDF documents from page images.
//!
//! [`DocumentSink`] is the seam the layout and rasterisation stages write
//! through; [`PdfAssembler`] implements it over `lopdf`. Every page holds
//! one or more image XObjects drawn into rectangles given in points.

use crate::error::{PixelDriftError, Result};
use crate::output::DocumentInfo;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Pixel payload for one page image.
#[derive(Debug, Clone)]
pub enum PageImage {
    /// Baseline JPEG, embedded as-is with `DCTDecode`.
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        gray: bool,
    },
    /// Uncompressed pixels, deflated on save. An alpha channel becomes a soft mask.
    Raw(DynamicImage),
}

impl PageImage {
    pub fn width(&self) -> u32 {
        match self {
            PageImage::Jpeg { width, .. } => *width,
            PageImage::Raw(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PageImage::Jpeg { height, .. } => *height,
            PageImage::Raw(img) => img.height(),
        }
    }
}

/// Rectangle in PDF points, origin at the bottom-left of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// The full `width × height` page.
    pub fn page(width: f32, height: f32) -> Self {
        Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// Handle to a page created by a [`DocumentSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(usize);

/// Write side of the document capability.
///
/// Implementations own the document being built; dropping one without
/// calling [`DocumentSink::finish`] discards it.
pub trait DocumentSink {
    /// Append an empty page of `width_pt × height_pt`.
    fn new_page(&mut self, width_pt: f32, height_pt: f32) -> Result<PageHandle>;

    /// Draw `image` into `rect` on `page`.
    fn embed_image(&mut self, page: PageHandle, image: PageImage, rect: Rect) -> Result<()>;

    /// Replace the document information dictionary.
    fn set_info(&mut self, info: &DocumentInfo) -> Result<()>;

    /// Serialise the document.
    fn finish(self) -> Result<Vec<u8>>;
}

struct PendingPage {
    width_pt: f32,
    height_pt: f32,
    xobjects: Dictionary,
    operations: Vec<Operation>,
}

/// [`DocumentSink`] producing a PDF 1.5 file through `lopdf`.
pub struct PdfAssembler {
    doc: Document,
    pages: Vec<PendingPage>,
    info: Option<ObjectId>,
    images: usize,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            info: None,
            images: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_image_xobject(&mut self, image: PageImage) -> ObjectId {
        match image {
            PageImage::Jpeg {
                data,
                width,
                height,
                gray,
            } => {
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => if gray { "DeviceGray" } else { "DeviceRGB" },
                    "BitsPerComponent" => 8i64,
                    "Filter" => "DCTDecode",
                };
                self.doc
                    .add_object(Stream::new(dict, data).with_compression(false))
            }
            PageImage::Raw(img) => {
                let (w, h) = (img.width() as i64, img.height() as i64);
                let color = img.color();
                let smask = color.has_alpha().then(|| {
                    let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
                    let dict = dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => w,
                        "Height" => h,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8i64,
                    };
                    self.doc.add_object(Stream::new(dict, alpha))
                });

                let (space, samples) = if color.has_color() {
                    ("DeviceRGB", img.to_rgb8().into_raw())
                } else {
                    ("DeviceGray", img.to_luma8().into_raw())
                };
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w,
                    "Height" => h,
                    "ColorSpace" => space,
                    "BitsPerComponent" => 8i64,
                };
                if let Some(mask) = smask {
                    dict.set("SMask", Object::Reference(mask));
                }
                self.doc.add_object(Stream::new(dict, samples))
            }
        }
    }
}

impl DocumentSink for PdfAssembler {
    fn new_page(&mut self, width_pt: f32, height_pt: f32) -> Result<PageHandle> {
        if !(width_pt > 0.0 && height_pt > 0.0) {
            return Err(PixelDriftError::validation(format!(
                "page size must be positive, got {width_pt}x{height_pt} pt"
            )));
        }
        self.pages.push(PendingPage {
            width_pt,
            height_pt,
            xobjects: Dictionary::new(),
            operations: Vec::new(),
        });
        Ok(PageHandle(self.pages.len() - 1))
    }

    fn embed_image(&mut self, page: PageHandle, image: PageImage, rect: Rect) -> Result<()> {
        if page.0 >= self.pages.len() {
            return Err(PixelDriftError::Internal(format!(
                "unknown page handle {}",
                page.0
            )));
        }
        let id = self.add_image_xobject(image);
        self.images += 1;
        let name = format!("Im{}", self.images);

        let pending = &mut self.pages[page.0];
        pending.xobjects.set(name.as_str(), Object::Reference(id));
        pending.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.into(),
                    0.into(),
                    rect.height.into(),
                    rect.x.into(),
                    rect.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn set_info(&mut self, info: &DocumentInfo) -> Result<()> {
        let mut dict = Dictionary::new();
        for (key, value) in info.entries() {
            dict.set(key, text_string(value));
        }
        match self.info {
            Some(id) => {
                self.doc.objects.insert(id, Object::Dictionary(dict));
            }
            None => self.info = Some(self.doc.add_object(dict)),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(PixelDriftError::validation("document has no pages"));
        }

        let pages_id = self.doc.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            }
            .encode()
            .map_err(pdf_error)?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.width_pt.into(), page.height_pt.into()],
                "Resources" => dictionary! { "XObject" => page.xobjects },
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        if let Some(info_id) = self.info {
            self.doc.trailer.set("Info", info_id);
        }

        self.doc.compress();
        let mut out = Vec::new();
        self.doc.save_to(&mut out).map_err(|e| PixelDriftError::Encode {
            item: "pdf".into(),
            detail: e.to_string(),
        })?;
        debug!("Assembled PDF: {} pages, {} bytes", count, out.len());
        Ok(out)
    }
}

fn pdf_error(e: lopdf::Error) -> PixelDriftError {
    PixelDriftError::Encode {
        item: "pdf".into(),
        detail: e.to_string(),
    }
}

// ── Text strings ─────────────────────────────────────────────────────────

/// PDF text string: a literal for ASCII, UTF-16BE with BOM otherwise.
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8, or Latin-1).
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
