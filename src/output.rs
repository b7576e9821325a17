//! Output types produced by pixeldrift operations.

use crate::error::{PixelDriftError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_ZIP: &str = "application/zip";

/// One produced file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl OutputArtifact {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write the artifact as `dir/<filename>`.
    ///
    /// Uses atomic write (temp file + rename) so readers never observe a
    /// partial file.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let path = dir.join(&self.filename);
        let fail = |source: std::io::Error| PixelDriftError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(fail)?;

        let tmp_path = dir.join(format!(".{}.tmp", self.filename));
        tokio::fs::write(&tmp_path, &self.bytes).await.map_err(fail)?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(fail(e));
        }
        Ok(path)
    }
}

/// Ordered per-item outputs of a batch operation, in input order.
///
/// Only ever constructed after every item succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    artifacts: Vec<OutputArtifact>,
}

impl BatchResult {
    pub(crate) fn new(artifacts: Vec<OutputArtifact>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &[OutputArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn into_artifacts(self) -> Vec<OutputArtifact> {
        self.artifacts
    }
}

/// Descriptive information about a PDF, read without rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

impl DocumentInfo {
    /// `(PDF Info key, value)` for every populated text field.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
            ("CreationDate", &self.creation_date),
            ("ModDate", &self.modification_date),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
        .collect()
    }
}
