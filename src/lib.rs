//! # Gallery Classifier
//!
//! A small image-classification sample built on the Burn framework.
//! Training images live in a directory-per-class tree (e.g. `photos/food/*`,
//! `photos/people/*`); the trainer enumerates them, shuffles and splits them
//! 80/20, fits a CNN with validation-driven model selection, and writes a
//! single-file model bundle. The predictor loads that bundle and classifies
//! in-memory images one at a time.
//!
//! ## Modules
//!
//! - `dataset`: directory enumeration, data records, split strategy, Burn
//!   dataset/batcher integration
//! - `pipeline`: named pipeline stages and the label key codec
//! - `model`: CNN architecture and the on-disk model bundle
//! - `training`: the training orchestrator
//! - `inference`: the prediction engine
//! - `metrics`: multiclass evaluation (accuracy, log-loss, per-class)
//! - supporting concerns live in `backend`, `config`, `error`, `logging`

pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod training;

// Re-export commonly used items for convenience
pub use config::{PredictorConfig, TrainerConfig};
pub use dataset::loader::{enumerate_images, load_images_in_memory, DatasetStats};
pub use dataset::records::{ImageRecord, InMemoryImageRecord};
pub use dataset::split::TrainingDataset;
pub use error::{GalleryError, Result};
pub use inference::engine::{Prediction, PredictionEngine};
pub use metrics::{ClassMetrics, ConfusionMatrix, Metrics};
pub use model::bundle::{copy_model_bundle, ModelBundle, ModelMetadata};
pub use model::cnn::{GalleryClassifier, GalleryClassifierConfig};
pub use pipeline::LabelCodec;

/// Default edge length (pixels) images are resized to before entering the
/// network.
pub const IMAGE_SIZE: usize = 64;

/// Default fraction of the dataset held out for validation.
pub const VALIDATION_FRACTION: f64 = 0.2;

/// Default seed for every shuffle, so runs are reproducible.
pub const DEFAULT_SEED: u64 = 1;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
