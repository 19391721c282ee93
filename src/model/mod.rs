//! Model architecture and on-disk persistence.

pub mod bundle;
pub mod cnn;

pub use bundle::{copy_model_bundle, ModelBundle, ModelMetadata};
pub use cnn::{GalleryClassifier, GalleryClassifierConfig};
