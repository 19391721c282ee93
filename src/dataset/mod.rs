//! Data loading and dataset handling.
//!
//! - `records`: the shared data-model types
//! - `loader`: directory-per-class enumeration
//! - `split`: seeded shuffle and train/validation split
//! - `burn_dataset`: Burn `Dataset`/`Batcher` integration

pub mod burn_dataset;
pub mod loader;
pub mod records;
pub mod split;

pub use burn_dataset::{GalleryBatch, GalleryBatcher, GalleryDataset, GalleryItem};
pub use loader::{enumerate_images, load_images_in_memory, DatasetStats};
pub use records::{ImageRecord, InMemoryImageRecord};
pub use split::TrainingDataset;
