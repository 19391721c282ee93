//! Single-file model persistence.
//!
//! A trained model ships as one `.tar.gz` bundle holding two entries:
//!
//! - `metadata.json` - the label schema and training provenance
//! - `model.bin` - the serialized network weights
//!
//! Keeping the label schema inside the same file as the weights means the
//! predictor needs nothing but the bundle path; labels can never drift out
//! of sync with the weights they were trained against.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tar::{Archive, Builder};
use tracing::info;

use crate::error::{GalleryError, Result};
use crate::model::cnn::{GalleryClassifier, GalleryClassifierConfig};

const METADATA_ENTRY: &str = "metadata.json";
const WEIGHTS_ENTRY: &str = "model.bin";

/// Label schema and provenance stored alongside the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Class labels in encoding order; index i is the label for output i
    pub class_labels: Vec<String>,
    /// Edge length images were resized to during training
    pub image_size: usize,
    /// Number of epochs the model was trained for
    pub epochs: usize,
    /// Best validation accuracy observed during training
    pub validation_accuracy: f64,
    /// RFC 3339 timestamp of when training finished
    pub trained_at: String,
}

impl ModelMetadata {
    pub fn new(
        class_labels: Vec<String>,
        image_size: usize,
        epochs: usize,
        validation_accuracy: f64,
    ) -> Self {
        Self {
            class_labels,
            image_size,
            epochs,
            validation_accuracy,
            trained_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GalleryError::Serialization(e.to_string()))
    }

    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GalleryError::Serialization(e.to_string()))
    }
}

/// A metadata + weights pair, the unit of model persistence.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub metadata: ModelMetadata,
    pub weights: Vec<u8>,
}

impl ModelBundle {
    pub fn new(metadata: ModelMetadata, weights: Vec<u8>) -> Self {
        Self { metadata, weights }
    }

    /// Write the bundle as a gzip-compressed tar archive.
    ///
    /// Missing parent directories are created.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);

        let json = self.metadata.to_json()?;
        append_entry(&mut builder, METADATA_ENTRY, json.as_bytes())?;
        append_entry(&mut builder, WEIGHTS_ENTRY, &self.weights)?;

        builder
            .finish()
            .map_err(|e| GalleryError::Model(format!("Failed to finalize bundle: {}", e)))?;

        info!("Saved model bundle to {:?}", path);
        Ok(())
    }

    /// Read a bundle back from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GalleryError::PathNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let decoder = GzDecoder::new(file);
        let mut archive = Archive::new(decoder);

        let mut metadata = None;
        let mut weights = None;

        for entry in archive
            .entries()
            .map_err(|e| GalleryError::Model(format!("Failed to read bundle: {}", e)))?
        {
            let mut entry =
                entry.map_err(|e| GalleryError::Model(format!("Corrupt bundle entry: {}", e)))?;
            let name = entry
                .path()
                .map_err(|e| GalleryError::Model(e.to_string()))?
                .to_string_lossy()
                .into_owned();

            match name.as_str() {
                METADATA_ENTRY => {
                    let mut json = String::new();
                    entry.read_to_string(&mut json)?;
                    metadata = Some(ModelMetadata::from_json(&json)?);
                }
                WEIGHTS_ENTRY => {
                    let mut buffer = Vec::new();
                    entry.read_to_end(&mut buffer)?;
                    weights = Some(buffer);
                }
                _ => {}
            }
        }

        match (metadata, weights) {
            (Some(metadata), Some(weights)) => Ok(Self { metadata, weights }),
            (None, _) => Err(GalleryError::Model(format!(
                "{} missing from bundle {:?}",
                METADATA_ENTRY, path
            ))),
            (_, None) => Err(GalleryError::Model(format!(
                "{} missing from bundle {:?}",
                WEIGHTS_ENTRY, path
            ))),
        }
    }
}

impl ModelBundle {
    /// Reconstruct the network from the stored weights.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<GalleryClassifier<B>> {
        restore_model(&self.weights, self.metadata.num_classes(), device)
    }
}

/// Rebuild a model from serialized weights.
pub fn restore_model<B: Backend>(
    weights: &[u8],
    num_classes: usize,
    device: &B::Device,
) -> Result<GalleryClassifier<B>> {
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let record = recorder
        .load(weights.to_vec(), device)
        .map_err(|e| GalleryError::Model(format!("Failed to load model weights: {:?}", e)))?;
    let model = GalleryClassifierConfig::new(num_classes)
        .init::<B>(device)
        .load_record(record);
    Ok(model)
}

fn append_entry<W: std::io::Write>(
    builder: &mut Builder<W>,
    name: &str,
    bytes: &[u8],
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header
        .set_path(name)
        .map_err(|e| GalleryError::Model(e.to_string()))?;
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append(&header, bytes)
        .map_err(|e| GalleryError::Model(format!("Failed to add {} to bundle: {}", name, e)))?;
    Ok(())
}

/// Copy a saved bundle byte-for-byte to the predictor's model location,
/// creating parent directories as needed.
pub fn copy_model_bundle(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(GalleryError::PathNotFound(src.to_path_buf()));
    }
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(src, dst)?;
    info!("Copied model bundle {:?} -> {:?}", src, dst);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> ModelBundle {
        let metadata = ModelMetadata::new(
            vec!["cosmos".into(), "food".into(), "people".into()],
            64,
            10,
            0.85,
        );
        ModelBundle::new(metadata, vec![1, 2, 3, 4, 5])
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tar.gz");

        sample_bundle().save(&path).unwrap();
        let loaded = ModelBundle::load(&path).unwrap();

        assert_eq!(
            loaded.metadata.class_labels,
            vec!["cosmos", "food", "people"]
        );
        assert_eq!(loaded.metadata.image_size, 64);
        assert_eq!(loaded.metadata.num_classes(), 3);
        assert_eq!(loaded.weights, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/model.tar.gz");
        sample_bundle().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ModelBundle::load(Path::new("/nope/model.tar.gz")),
            Err(GalleryError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_load_rejects_non_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.tar.gz");
        std::fs::write(&path, b"definitely not a tar.gz").unwrap();
        assert!(ModelBundle::load(&path).is_err());
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("out/model.tar.gz");
        let dst = dir.path().join("predictor/model/model.tar.gz");

        sample_bundle().save(&src).unwrap();
        copy_model_bundle(&src, &dst).unwrap();

        let a = std::fs::read(&src).unwrap();
        let b = std::fs::read(&dst).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            copy_model_bundle(Path::new("/nope.tar.gz"), &dir.path().join("x")),
            Err(GalleryError::PathNotFound(_))
        ));
    }
}
