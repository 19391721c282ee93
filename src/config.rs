//! Workflow configuration.
//!
//! Each workflow entry point takes an explicit config struct; there is no
//! shared mutable context between the two executables. Defaults reproduce
//! the shipped asset layout, so both binaries run without any flags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_SEED, IMAGE_SIZE, VALIDATION_FRACTION};

/// Configuration for the training workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Root of the directory-per-class training tree
    pub photos_dir: PathBuf,
    /// Where the trained model bundle is written
    pub output_model_path: PathBuf,
    /// Where the predictor expects its copy of the bundle
    pub predictor_model_path: PathBuf,
    /// Folder of sample images for the illustrative post-training prediction
    pub sample_images_dir: PathBuf,
    /// Fraction of the dataset held out for validation
    pub validation_fraction: f64,
    /// Random seed for shuffling and splitting
    pub seed: u64,
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size for training and validation passes
    pub batch_size: usize,
    /// Learning rate for the Adam optimizer
    pub learning_rate: f64,
    /// Edge length images are resized to
    pub image_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            photos_dir: PathBuf::from("assets/inputs/images/photos"),
            output_model_path: PathBuf::from("assets/outputs/image_classifier.tar.gz"),
            predictor_model_path: PathBuf::from("assets/inputs/model/image_classifier.tar.gz"),
            sample_images_dir: PathBuf::from("assets/inputs/test-images"),
            validation_fraction: VALIDATION_FRACTION,
            seed: DEFAULT_SEED,
            epochs: 10,
            batch_size: 16,
            learning_rate: 1e-3,
            image_size: IMAGE_SIZE,
        }
    }
}

/// Configuration for the prediction workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Path to the serialized model bundle
    pub model_path: PathBuf,
    /// Folder of images to classify
    pub images_dir: PathBuf,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/inputs/model/image_classifier.tar.gz"),
            images_dir: PathBuf::from("assets/inputs/images-for-predictions"),
        }
    }
}
