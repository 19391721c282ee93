//! Burn `Dataset`/`Batcher` integration.
//!
//! Items carry preprocessed pixel data (resized, CHW, scaled to [0, 1]);
//! the batcher stacks items into tensors and applies ImageNet mean/std
//! normalization. Training and inference both go through the same batcher,
//! so the preprocessing a prediction sees is exactly what the model was
//! fitted on.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::dataset::records::InMemoryImageRecord;
use crate::error::{GalleryError, Result};

/// ImageNet channel means, CHW order.
const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations, CHW order.
const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// One image ready for batching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GalleryItem {
    /// Flattened CHW float array, `3 * size * size`, values in [0, 1]
    pub image: Vec<f32>,
    /// Encoded class label
    pub label: usize,
    /// File name, for display in prediction output
    pub name: String,
}

impl GalleryItem {
    /// Load an image file, resize it and convert to CHW floats.
    pub fn from_path(path: &Path, label: usize, image_size: usize) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| GalleryError::ImageLoad(path.to_path_buf(), e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_decoded(img, label, name, image_size))
    }

    /// Decode an in-memory record and preprocess it. Unlabeled records get
    /// label 0, which inference ignores.
    pub fn from_record(record: &InMemoryImageRecord, image_size: usize) -> Result<Self> {
        let img = image::load_from_memory(&record.bytes).map_err(|e| {
            GalleryError::ImageLoad(record.file_name.clone().into(), e.to_string())
        })?;
        Ok(Self::from_decoded(
            img,
            0,
            record.file_name.clone(),
            image_size,
        ))
    }

    fn from_decoded(
        img: image::DynamicImage,
        label: usize,
        name: String,
        image_size: usize,
    ) -> Self {
        let img = img
            .resize_exact(image_size as u32, image_size as u32, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (image_size, image_size);
        let mut image = vec![0.0f32; 3 * height * width];

        // CHW layout, scaled to [0, 1]
        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    image[c * height * width + y * width + x] = pixel[c] as f32 / 255.0;
                }
            }
        }

        Self { image, label, name }
    }
}

/// An in-memory dataset of preprocessed items.
///
/// The photo trees this targets fit comfortably in RAM, so every item is
/// decoded once up front rather than on each epoch.
#[derive(Debug, Clone)]
pub struct GalleryDataset {
    items: Vec<GalleryItem>,
}

impl GalleryDataset {
    pub fn new(items: Vec<GalleryItem>) -> Self {
        Self { items }
    }

    /// Decode and preprocess a list of (path, label) samples.
    pub fn from_samples(samples: &[(std::path::PathBuf, usize)], image_size: usize) -> Result<Self> {
        let items = samples
            .iter()
            .map(|(path, label)| GalleryItem::from_path(path, *label, image_size))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }
}

impl Dataset<GalleryItem> for GalleryDataset {
    fn get(&self, index: usize) -> Option<GalleryItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of images and their encoded labels.
#[derive(Clone, Debug)]
pub struct GalleryBatch<B: Backend> {
    /// Images, shape `[batch_size, 3, height, width]`, normalized
    pub images: Tensor<B, 4>,
    /// Encoded labels, shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks items into normalized tensors.
#[derive(Clone, Debug)]
pub struct GalleryBatcher {
    image_size: usize,
}

impl GalleryBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }

    /// Batch a single item, for one-at-a-time inference.
    pub fn single<B: Backend>(&self, item: GalleryItem, device: &B::Device) -> GalleryBatch<B> {
        self.batch(vec![item], device)
    }
}

impl<B: Backend> Batcher<B, GalleryItem, GalleryBatch<B>> for GalleryBatcher {
    fn batch(&self, items: Vec<GalleryItem>, device: &B::Device) -> GalleryBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            device,
        );

        // (x - mean) / std, broadcast over batch and spatial dims
        let mean = Tensor::<B, 4>::from_floats(
            TensorData::new(NORM_MEAN.to_vec(), [1, 3, 1, 1]),
            device,
        );
        let std = Tensor::<B, 4>::from_floats(
            TensorData::new(NORM_STD.to_vec(), [1, 3, 1, 1]),
            device,
        );
        let images = (images - mean) / std;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        GalleryBatch { images, targets }
    }
}
