//! Directory-to-dataset loader.
//!
//! The training tree is organized as one subfolder per class:
//!
//! ```text
//! photos/
//! ├── cosmos/
//! │   ├── img001.jpg
//! │   └── img002.jpg
//! ├── food/
//! │   └── ...
//! └── people/
//!     └── ...
//! ```
//!
//! Every regular file found recursively under a class folder becomes one
//! [`ImageRecord`] tagged with that folder's name. Enumeration order is
//! whatever the filesystem yields; callers shuffle explicitly if they need
//! a permutation.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::dataset::records::{ImageRecord, InMemoryImageRecord};
use crate::error::{GalleryError, Result};

/// Enumerate all labeled images under `root`.
///
/// Fails with [`GalleryError::PathNotFound`] if the root folder does not
/// exist; silently skips non-file entries. An empty root yields an empty
/// vector.
pub fn enumerate_images(root: &Path) -> Result<Vec<ImageRecord>> {
    if !root.exists() {
        return Err(GalleryError::PathNotFound(root.to_path_buf()));
    }

    let mut records = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let label = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => continue,
        };

        let mut class_count = 0usize;
        for file in WalkDir::new(entry.path())
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            records.push(ImageRecord::new(file.path(), label.clone()));
            class_count += 1;
        }

        debug!("Class '{}': {} files", label, class_count);
    }

    info!("Enumerated {} images under {:?}", records.len(), root);
    Ok(records)
}

/// Read every regular file in a flat folder into unlabeled in-memory
/// records, for prediction input.
pub fn load_images_in_memory(dir: &Path) -> Result<Vec<InMemoryImageRecord>> {
    if !dir.exists() {
        return Err(GalleryError::PathNotFound(dir.to_path_buf()));
    }

    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            records.push(InMemoryImageRecord::from_file(&entry.path())?);
        }
    }

    info!("Loaded {} prediction images from {:?}", records.len(), dir);
    Ok(records)
}

/// Per-class counts over a set of records
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub class_counts: BTreeMap<String, usize>,
}

impl DatasetStats {
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *class_counts.entry(record.label.clone()).or_default() += 1;
        }
        Self {
            total_samples: records.len(),
            class_counts,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.class_counts.len()
    }

    /// Print statistics to console
    pub fn print(&self) {
        println!("\nDataset statistics:");
        println!("  Total images: {}", self.total_samples);
        println!("  Classes:      {}", self.num_classes());
        for (label, count) in &self.class_counts {
            let bar_len = if self.total_samples > 0 {
                (*count as f32 / self.total_samples as f32 * 40.0) as usize
            } else {
                0
            };
            println!("    {:20} {:5} {}", label, count, "#".repeat(bar_len));
        }
    }
}
