//! The prediction engine.
//!
//! Loads a saved model bundle once and classifies in-memory images one at
//! a time. Batch prediction is just the single-image path applied to each
//! record in turn, so both paths share one code route and cannot diverge.

use std::path::Path;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{default_device, DefaultBackend};
use crate::dataset::burn_dataset::{GalleryBatcher, GalleryItem};
use crate::dataset::records::InMemoryImageRecord;
use crate::error::{GalleryError, Result};
use crate::metrics::argmax;
use crate::model::bundle::{ModelBundle, ModelMetadata};
use crate::model::cnn::GalleryClassifier;
use crate::pipeline::LabelCodec;

/// One classified image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// File name of the classified image
    pub file_name: String,
    /// Predicted class label
    pub label: String,
    /// Probability of the predicted class
    pub score: f32,
    /// Full per-class probabilities, in label encoding order
    pub probabilities: Vec<f32>,
    /// Class labels in the same order as `probabilities`
    pub class_labels: Vec<String>,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Image Filename : [{}], Predicted Label : [{}], Probability : [{:.4}]",
            self.file_name, self.label, self.score
        )
    }
}

impl Prediction {
    /// The `k` most probable labels with their scores, best first
    pub fn top_k(&self, k: usize) -> Vec<(String, f32)> {
        let mut indexed: Vec<(usize, f32)> = self
            .probabilities
            .iter()
            .copied()
            .enumerate()
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed
            .into_iter()
            .take(k)
            .filter_map(|(i, p)| self.class_labels.get(i).map(|l| (l.clone(), p)))
            .collect()
    }

    /// Print with the label colorized by confidence
    pub fn print(&self) {
        let label = if self.score >= 0.8 {
            self.label.green().bold()
        } else if self.score >= 0.5 {
            self.label.yellow()
        } else {
            self.label.red()
        };
        println!(
            "Image Filename : [{}], Predicted Label : [{}], Probability : [{:.4}]",
            self.file_name, label, self.score
        );
    }
}

/// A loaded model plus everything needed to classify images with it.
pub struct PredictionEngine {
    model: GalleryClassifier<DefaultBackend>,
    codec: LabelCodec,
    batcher: GalleryBatcher,
    metadata: ModelMetadata,
    device: <DefaultBackend as burn::tensor::backend::Backend>::Device,
}

impl PredictionEngine {
    /// Load a model bundle from disk.
    pub fn load(bundle_path: &Path) -> Result<Self> {
        let bundle = ModelBundle::load(bundle_path)?;
        let device = default_device();
        let model = bundle.restore::<DefaultBackend>(&device)?;
        let codec = LabelCodec::from_labels(bundle.metadata.class_labels.clone());
        let batcher = GalleryBatcher::new(bundle.metadata.image_size);

        info!(
            "Loaded model from {:?} ({} classes, trained {})",
            bundle_path,
            codec.num_classes(),
            bundle.metadata.trained_at
        );

        Ok(Self {
            model,
            codec,
            batcher,
            metadata: bundle.metadata,
            device,
        })
    }

    /// Classify one in-memory image.
    pub fn predict(&self, record: &InMemoryImageRecord) -> Result<Prediction> {
        let item = GalleryItem::from_record(record, self.metadata.image_size)?;
        self.predict_item(item)
    }

    /// Classify each record in turn.
    pub fn predict_all(&self, records: &[InMemoryImageRecord]) -> Result<Vec<Prediction>> {
        records.iter().map(|record| self.predict(record)).collect()
    }

    fn predict_item(&self, item: GalleryItem) -> Result<Prediction> {
        let file_name = item.name.clone();
        let batch = self.batcher.single::<DefaultBackend>(item, &self.device);
        let probs = self.model.forward_softmax(batch.images);

        let probabilities: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| GalleryError::Inference(format!("{:?}", e)))?;

        if probabilities.len() != self.codec.num_classes() {
            return Err(GalleryError::Inference(format!(
                "Model produced {} scores for {} labels",
                probabilities.len(),
                self.codec.num_classes()
            )));
        }

        let best = argmax(&probabilities);
        let label = self.codec.decode(best)?.to_string();
        let score = probabilities[best];

        Ok(Prediction {
            file_name,
            label,
            score,
            probabilities,
            class_labels: self.codec.labels().to_vec(),
        })
    }

    /// Class labels in encoding order
    pub fn class_labels(&self) -> &[String] {
        self.codec.labels()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::module::Module;
    use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};

    use crate::model::cnn::GalleryClassifierConfig;

    fn png_record(name: &str, rgb: [u8; 3]) -> InMemoryImageRecord {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb(rgb));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        InMemoryImageRecord {
            file_name: name.to_string(),
            bytes,
            label: None,
        }
    }

    /// Save a bundle holding a freshly initialized (untrained) model.
    fn write_test_bundle(dir: &Path, labels: &[&str], image_size: usize) -> std::path::PathBuf {
        let device = default_device();
        let model = GalleryClassifierConfig::new(labels.len()).init::<DefaultBackend>(&device);
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let weights = recorder.record(model.into_record(), ()).unwrap();

        let metadata = ModelMetadata::new(
            labels.iter().map(|s| s.to_string()).collect(),
            image_size,
            1,
            0.0,
        );
        let path = dir.join("model.tar.gz");
        ModelBundle::new(metadata, weights).save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_and_predict() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_bundle(dir.path(), &["cosmos", "food", "people"], 16);

        let engine = PredictionEngine::load(&path).unwrap();
        assert_eq!(engine.class_labels(), &["cosmos", "food", "people"]);

        let prediction = engine.predict(&png_record("sky.png", [10, 20, 200])).unwrap();
        assert_eq!(prediction.file_name, "sky.png");
        assert!(engine
            .class_labels()
            .iter()
            .any(|l| l == &prediction.label));
        assert_eq!(prediction.probabilities.len(), 3);

        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!((0.0..=1.0).contains(&prediction.score));
    }

    #[test]
    fn test_predict_all_matches_single_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_bundle(dir.path(), &["a", "b"], 16);
        let engine = PredictionEngine::load(&path).unwrap();

        let records = vec![
            png_record("one.png", [200, 10, 10]),
            png_record("two.png", [10, 200, 10]),
        ];

        let all = engine.predict_all(&records).unwrap();
        assert_eq!(all.len(), 2);
        for (record, batched) in records.iter().zip(all.iter()) {
            let single = engine.predict(record).unwrap();
            assert_eq!(single.label, batched.label);
            assert_eq!(single.probabilities, batched.probabilities);
        }
    }

    #[test]
    fn test_predict_rejects_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_bundle(dir.path(), &["a", "b"], 16);
        let engine = PredictionEngine::load(&path).unwrap();

        let record = InMemoryImageRecord {
            file_name: "junk.bin".to_string(),
            bytes: vec![0xde, 0xad, 0xbe, 0xef],
            label: None,
        };
        assert!(matches!(
            engine.predict(&record),
            Err(GalleryError::ImageLoad(_, _))
        ));
    }

    #[test]
    fn test_load_missing_bundle() {
        assert!(matches!(
            PredictionEngine::load(Path::new("/no/model.tar.gz")),
            Err(GalleryError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_prediction_display_format() {
        let prediction = Prediction {
            file_name: "burger.jpg".to_string(),
            label: "food".to_string(),
            score: 0.9231,
            probabilities: vec![0.9231, 0.0769],
            class_labels: vec!["food".to_string(), "trees".to_string()],
        };
        assert_eq!(
            prediction.to_string(),
            "Image Filename : [burger.jpg], Predicted Label : [food], Probability : [0.9231]"
        );

        let top = prediction.top_k(2);
        assert_eq!(top[0].0, "food");
        assert_eq!(top[1].0, "trees");
        assert!(top[0].1 >= top[1].1);
    }
}
