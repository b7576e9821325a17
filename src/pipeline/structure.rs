//! Structural page copy between PDF documents.
//!
//! Pages are copied object by object: the page dictionary itself is always
//! fresh (a page may be requested twice), everything it references is copied
//! once per source document and shared between repeats. Attributes a page
//! inherits from its page-tree ancestors (`MediaBox`, `CropBox`,
//! `Resources`, `Rotate`) are materialised on the copy, since the ancestors
//! are not carried over.

use crate::error::{PixelDriftError, Result};
use crate::output::DocumentInfo;
use crate::pipeline::document::decode_text;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use tracing::{debug, warn};

const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards the parent walk against malformed (cyclic) page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Parse a PDF, mapping failures to [`PixelDriftError::CorruptPdf`].
pub fn load_pdf(bytes: &[u8], item: &str) -> Result<Document> {
    let doc = Document::load_mem(bytes).map_err(|e| PixelDriftError::CorruptPdf {
        item: item.to_string(),
        detail: e.to_string(),
    })?;
    debug!("Loaded '{}': {} pages", item, doc.get_pages().len());
    Ok(doc)
}

/// Object ids of the pages in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Builds a new document out of pages copied from others.
pub struct PageCopier {
    target: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PageCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCopier {
    pub fn new() -> Self {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();
        Self {
            target,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append pages of `source` in the given order. Repeats are allowed.
    pub fn append(&mut self, source: &Document, pages: &[ObjectId]) -> Result<()> {
        let mut copied = HashMap::new();
        for &page_id in pages {
            self.append_page(source, page_id, &mut copied)?;
        }
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Close the page tree and serialise.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PixelDriftError::validation("no pages selected"));
        }
        let count = self.kids.len() as i64;
        self.target.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => std::mem::take(&mut self.kids),
                "Count" => count,
            }),
        );
        let catalog_id = self.target.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.target.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        self.target
            .save_to(&mut out)
            .map_err(|e| PixelDriftError::Encode {
                item: "pdf".into(),
                detail: e.to_string(),
            })?;
        Ok(out)
    }

    fn append_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let dict = source
            .get_dictionary(page_id)
            .map_err(|e| PixelDriftError::CorruptPdf {
                item: format!("page object {page_id:?}"),
                detail: e.to_string(),
            })?;

        let mut page = self.copy_dict(source, dict, copied);
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited(source, dict, key) {
                let value = self.copy_object(source, value, copied);
                page.set(key, value);
            }
        }
        page.set("Parent", Object::Reference(self.pages_id));

        let id = self.target.add_object(page);
        self.kids.push(Object::Reference(id));
        Ok(())
    }

    fn copy_object(
        &mut self,
        source: &Document,
        obj: &Object,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Object {
        match obj {
            Object::Reference(id) => Object::Reference(self.copy_reference(source, *id, copied)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|o| self.copy_object(source, o, copied))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(source, dict, copied)),
            Object::Stream(stream) => Object::Stream(
                Stream::new(self.copy_dict(source, &stream.dict, copied), stream.content.clone())
                    .with_compression(stream.allows_compression),
            ),
            other => other.clone(),
        }
    }

    fn copy_reference(
        &mut self,
        source: &Document,
        id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> ObjectId {
        if let Some(&new_id) = copied.get(&id) {
            return new_id;
        }
        // Reserve first so cycles resolve to the id being built.
        let new_id = self.target.new_object_id();
        copied.insert(id, new_id);

        let object = match source.get_object(id) {
            Ok(obj) => self.copy_object(source, obj, copied),
            Err(e) => {
                warn!("Unresolvable reference {:?}: {}; replaced with null", id, e);
                Object::Null
            }
        };
        self.target.objects.insert(new_id, object);
        new_id
    }

    fn copy_dict(
        &mut self,
        source: &Document,
        dict: &Dictionary,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            // The parent link would drag in the source page tree.
            if key == b"Parent" {
                continue;
            }
            out.set(key.clone(), self.copy_object(source, value, copied));
        }
        out
    }
}

/// Look `key` up on the ancestors of a page dictionary.
fn inherited<'a>(source: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// Read the information dictionary without rendering anything.
pub fn read_info(doc: &Document) -> DocumentInfo {
    let info = doc.trailer.get(b"Info").ok().and_then(|obj| match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    });

    let text = |key: &[u8]| -> Option<String> {
        let obj = info?.get(key).ok()?;
        let obj = match obj {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            other => other,
        };
        let value = match obj {
            Object::String(bytes, _) => decode_text(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    };

    DocumentInfo {
        title: text(b"Title"),
        author: text(b"Author"),
        subject: text(b"Subject"),
        keywords: text(b"Keywords"),
        creator: text(b"Creator"),
        producer: text(b"Producer"),
        creation_date: text(b"CreationDate"),
        modification_date: text(b"ModDate"),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A document whose pages inherit their MediaBox from the tree root and
    /// each draw a distinct marker in their content stream.
    pub(crate) fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for i in 0..pages {
            let content = format!("BT /F1 12 Tf 72 720 Td (page {}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Sample"),
            "Producer" => Object::string_literal("hand-built"),
        });
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// The marker text drawn by each page, in order.
    pub(crate) fn page_markers(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .keys()
            .map(|&n| {
                let content = doc.get_page_content(doc.get_pages()[&n]).unwrap();
                let text = String::from_utf8_lossy(&content).into_owned();
                let start = text.find('(').unwrap() + 1;
                let end = text.find(')').unwrap();
                text[start..end].to_string()
            })
            .collect()
    }

    #[test]
    fn copies_selected_pages_with_repeats() {
        let src = load_pdf(&sample_pdf(4), "in.pdf").unwrap();
        let ids = page_ids(&src);
        let mut copier = PageCopier::new();
        copier.append(&src, &[ids[2], ids[0], ids[2]]).unwrap();
        assert_eq!(copier.page_count(), 3);
        let out = copier.finish().unwrap();
        assert_eq!(page_markers(&out), vec!["page 3", "page 1", "page 3"]);
    }

    #[test]
    fn inherited_attributes_are_materialised() {
        let src = load_pdf(&sample_pdf(1), "in.pdf").unwrap();
        let mut copier = PageCopier::new();
        copier.append(&src, &page_ids(&src)).unwrap();
        let out = Document::load_mem(&copier.finish().unwrap()).unwrap();
        let (_, page_id) = out.get_pages().into_iter().next().unwrap();
        let page = out.get_dictionary(page_id).unwrap();
        let media: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media, vec![0.0, 0.0, 595.0, 842.0]);
        assert!(page.get(b"Resources").is_ok());
    }

    #[test]
    fn appends_across_documents() {
        let a = load_pdf(&sample_pdf(2), "a.pdf").unwrap();
        let b = load_pdf(&sample_pdf(1), "b.pdf").unwrap();
        let mut copier = PageCopier::new();
        copier.append(&a, &page_ids(&a)).unwrap();
        copier.append(&b, &page_ids(&b)).unwrap();
        let out = copier.finish().unwrap();
        assert_eq!(page_markers(&out), vec!["page 1", "page 2", "page 1"]);
    }

    #[test]
    fn nothing_selected_is_rejected() {
        assert!(PageCopier::new().finish().unwrap_err().is_validation_error());
    }

    #[test]
    fn garbage_is_corrupt_pdf() {
        match load_pdf(b"not a pdf", "x.pdf") {
            Err(PixelDriftError::CorruptPdf { item, .. }) => assert_eq!(item, "x.pdf"),
            other => panic!("expected CorruptPdf, got {other:?}"),
        }
    }

    #[test]
    fn reads_info_without_rendering() {
        let doc = load_pdf(&sample_pdf(3), "in.pdf").unwrap();
        let info = read_info(&doc);
        assert_eq!(info.title.as_deref(), Some("Sample"));
        assert_eq!(info.producer.as_deref(), Some("hand-built"));
        assert_eq!(info.author, None);
        assert_eq!(info.page_count, 3);
        assert_eq!(info.pdf_version, "1.5");
    }
}
