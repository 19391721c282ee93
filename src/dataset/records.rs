//! Data-model records shared by the trainer and the predictor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GalleryError, Result};

/// A single training image: its path on disk and the class label derived
/// from the immediate parent folder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label (the name of the folder the file lives under)
    pub label: String,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }

    /// File name component of the path, for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// An image held fully in memory, used for single-shot predictions where
/// no persistent dataset view is needed. The label is present only when the
/// record came from a labeled tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryImageRecord {
    /// File name the bytes were read from (display only)
    pub file_name: String,
    /// Raw, undecoded file contents
    pub bytes: Vec<u8>,
    /// Class label, if known
    pub label: Option<String>,
}

impl InMemoryImageRecord {
    /// Read a file into an unlabeled in-memory record
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| GalleryError::ImageLoad(path.to_path_buf(), e.to_string()))?;
        Ok(Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            bytes,
            label: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_record_file_name() {
        let record = ImageRecord::new("photos/food/burger.jpg", "food");
        assert_eq!(record.file_name(), "burger.jpg");
        assert_eq!(record.label, "food");
    }

    #[test]
    fn test_from_file_missing_path() {
        assert!(matches!(
            InMemoryImageRecord::from_file(Path::new("/definitely/not/here.jpg")),
            Err(GalleryError::ImageLoad(_, _))
        ));
    }

    #[test]
    fn test_in_memory_record_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let record = InMemoryImageRecord::from_file(&path).unwrap();
        assert_eq!(record.file_name, "pic.png");
        assert_eq!(record.bytes, b"not really a png");
        assert!(record.label.is_none());
    }
}
