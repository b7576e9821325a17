//! Named input assets.

use crate::error::{PixelDriftError, Result};

/// Raw bytes of one uploaded or on-disk asset together with the name it
/// arrived under. The name is used for output naming and error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputAsset {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name without directories and without its last extension.
    ///
    /// `"photos/cat.final.JPG"` → `"cat.final"`; `"README"` → `"README"`.
    pub fn base_name(&self) -> &str {
        let file = self
            .name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.name.as_str());
        match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        }
    }

    /// Reject assets larger than `limit` bytes before any decode attempt.
    pub fn check_size(&self, limit: usize) -> Result<()> {
        if self.bytes.len() > limit {
            return Err(PixelDriftError::ResourceLimit {
                item: self.name.clone(),
                size: self.bytes.len(),
                limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_dirs_and_last_extension() {
        assert_eq!(InputAsset::new("photos/cat.final.JPG", vec![]).base_name(), "cat.final");
        assert_eq!(InputAsset::new("C:\\scan.tiff", vec![]).base_name(), "scan");
        assert_eq!(InputAsset::new("README", vec![]).base_name(), "README");
        assert_eq!(InputAsset::new(".hidden", vec![]).base_name(), ".hidden");
    }

    #[test]
    fn size_guard() {
        let a = InputAsset::new("big.png", vec![0u8; 11]);
        assert!(a.check_size(11).is_ok());
        match a.check_size(10) {
            Err(PixelDriftError::ResourceLimit { item, size, limit }) => {
                assert_eq!((item.as_str(), size, limit), ("big.png", 11, 10));
            }
            other => panic!("expected ResourceLimit, got {other:?}"),
        }
    }
}
