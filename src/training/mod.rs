//! The training workflow.
//!
//! Runs the full pipeline: enumerate the photo tree, shuffle and split,
//! fit the label codec, preprocess, train with a plain Burn loop,
//! evaluate on the held-out subset, write the model bundle and copy it to
//! the predictor's folder. Model selection is validation-driven: the
//! weights saved are those of the epoch with the best validation accuracy,
//! not necessarily the last.

use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::AutodiffModule,
    module::Module,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::TrainerConfig;
use crate::dataset::burn_dataset::{GalleryBatcher, GalleryDataset};
use crate::dataset::loader::{enumerate_images, load_images_in_memory, DatasetStats};
use crate::dataset::split::TrainingDataset;
use crate::error::{GalleryError, Result};
use crate::inference::engine::PredictionEngine;
use crate::metrics::{Metrics, RunningAverage};
use crate::model::bundle::{copy_model_bundle, restore_model, ModelBundle, ModelMetadata};
use crate::model::cnn::{GalleryClassifier, GalleryClassifierConfig};
use crate::pipeline::{LabelCodec, Stage, StageTimer};

/// Summary returned by [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Best validation accuracy observed, in [0, 1]
    pub best_validation_accuracy: f64,
    /// Metrics of the selected model on the validation subset
    pub metrics: Metrics,
    /// Class labels in encoding order
    pub class_labels: Vec<String>,
}

/// Run the full training workflow with the given configuration.
pub fn run_training<B: AutodiffBackend>(config: &TrainerConfig) -> Result<TrainingReport> {
    if config.epochs == 0 {
        return Err(GalleryError::Config("Epochs must be at least 1".into()));
    }
    if config.batch_size == 0 {
        return Err(GalleryError::Config("Batch size must be at least 1".into()));
    }

    let device = B::Device::default();
    println!("{}", "Initializing training...".green().bold());
    println!("  Device: {:?}", device);

    // Load the photo tree
    let timer = StageTimer::start(Stage::LoadImages);
    let records = enumerate_images(&config.photos_dir)?;
    let stats = DatasetStats::from_records(&records);
    stats.print();
    if stats.total_samples == 0 {
        return Err(GalleryError::Dataset(format!(
            "No images found under {:?}; expected one subfolder per class",
            config.photos_dir
        )));
    }
    timer.finish();

    // Shuffle and split
    let timer = StageTimer::start(Stage::ShuffleAndSplit);
    let split =
        TrainingDataset::shuffle_split(records, config.validation_fraction, config.seed)?;
    split.print();
    timer.finish();

    // Fit the label codec on the training subset, in first-seen order
    let timer = StageTimer::start(Stage::MapLabels);
    let codec = LabelCodec::fit(split.train.iter().map(|r| r.label.as_str()));
    println!("  Labels: {}", codec.labels().join(", "));
    timer.finish();

    // Decode and preprocess every image up front
    let timer = StageTimer::start(Stage::Preprocess);
    let train_samples = encode_samples(&split.train, &codec)?;
    let val_samples = encode_samples(&split.validation, &codec)?;
    let train_dataset = GalleryDataset::from_samples(&train_samples, config.image_size)?;
    let val_dataset = GalleryDataset::from_samples(&val_samples, config.image_size)?;
    timer.finish();

    if train_dataset.len() < config.batch_size {
        println!(
            "{} training set ({}) smaller than batch size {}, batches will be partial",
            "note:".yellow(),
            train_dataset.len(),
            config.batch_size
        );
    }

    // Train
    let timer = StageTimer::start(Stage::Train);
    let (best_weights, best_val_acc) =
        train_loop::<B>(config, &codec, &train_dataset, &val_dataset, &device)?;
    timer.finish();

    // Evaluate the selected model on the validation subset
    let timer = StageTimer::start(Stage::Evaluate);
    let inner_device = <B::InnerBackend as Backend>::Device::default();
    let best_model = restore_model::<B::InnerBackend>(&best_weights, codec.num_classes(), &inner_device)?;
    let batcher = GalleryBatcher::new(config.image_size);
    let (probabilities, truths) = evaluate::<B::InnerBackend>(
        &best_model,
        &val_dataset,
        &batcher,
        config.batch_size,
        &inner_device,
    )?;
    let metrics = Metrics::from_probabilities(&probabilities, &truths, codec.num_classes());
    metrics.print(codec.labels());
    timer.finish();

    // Persist the bundle
    let timer = StageTimer::start(Stage::SaveModel);
    let metadata = ModelMetadata::new(
        codec.labels().to_vec(),
        config.image_size,
        config.epochs,
        best_val_acc,
    );
    ModelBundle::new(metadata, best_weights).save(&config.output_model_path)?;
    println!("  Saved to {:?}", config.output_model_path);
    timer.finish();

    // Copy to the predictor's model folder
    let timer = StageTimer::start(Stage::CopyModel);
    copy_model_bundle(&config.output_model_path, &config.predictor_model_path)?;
    println!("  Copied to {:?}", config.predictor_model_path);
    timer.finish();

    trial_prediction(config)?;

    println!();
    println!("{}", "Training complete!".green().bold());
    println!(
        "  Best validation accuracy: {:.2}%",
        best_val_acc * 100.0
    );

    Ok(TrainingReport {
        best_validation_accuracy: best_val_acc,
        metrics,
        class_labels: codec.labels().to_vec(),
    })
}

fn encode_samples(
    records: &[crate::dataset::records::ImageRecord],
    codec: &LabelCodec,
) -> Result<Vec<(std::path::PathBuf, usize)>> {
    records
        .iter()
        .map(|r| Ok((r.path.clone(), codec.encode(&r.label)?)))
        .collect()
}

/// The inner optimization loop. Returns the serialized weights of the
/// best-by-validation-accuracy model and that accuracy.
fn train_loop<B: AutodiffBackend>(
    config: &TrainerConfig,
    codec: &LabelCodec,
    train_dataset: &GalleryDataset,
    val_dataset: &GalleryDataset,
    device: &B::Device,
) -> Result<(Vec<u8>, f64)> {
    let batcher = GalleryBatcher::new(config.image_size);
    let model_config = GalleryClassifierConfig::new(codec.num_classes());
    let mut model = model_config.init::<B>(device);
    let mut optimizer = AdamConfig::new().init();
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();

    let inner_device = <B::InnerBackend as Backend>::Device::default();
    let inner_batcher = GalleryBatcher::new(config.image_size);

    println!("  Epochs: {}  Batch size: {}  Learning rate: {}", config.epochs, config.batch_size, config.learning_rate);

    let mut best_val_acc = -1.0f64;
    let mut best_weights: Option<Vec<u8>> = None;
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);

    for epoch in 0..config.epochs {
        let mut epoch_loss = RunningAverage::new();
        let mut correct = 0usize;
        let mut seen = 0usize;

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);

        for batch_indices in indices.chunks(config.batch_size) {
            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| train_dataset.get(i))
                .collect();
            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items, device);
            let output = model.forward(batch.images.clone());
            let loss = CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output.clone(), batch.targets.clone());

            epoch_loss.add(loss.clone().into_scalar().elem::<f64>());

            let batch_len = batch.targets.dims()[0];
            let predictions = output.argmax(1).reshape([batch_len]);
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch_len;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        // Validation pass on the inner backend
        let inner_model = model.clone().valid();
        let (probabilities, truths) = evaluate::<B::InnerBackend>(
            &inner_model,
            val_dataset,
            &inner_batcher,
            config.batch_size,
            &inner_device,
        )?;
        let val_metrics =
            Metrics::from_probabilities(&probabilities, &truths, codec.num_classes());

        let is_best = val_metrics.accuracy > best_val_acc;
        if is_best {
            best_val_acc = val_metrics.accuracy;
            let bytes = recorder
                .record(inner_model.into_record(), ())
                .map_err(|e| GalleryError::Model(format!("Failed to snapshot weights: {:?}", e)))?;
            best_weights = Some(bytes);
        }

        let train_acc = if seen > 0 {
            100.0 * correct as f64 / seen as f64
        } else {
            0.0
        };
        println!(
            "  Epoch {:>3}/{}: loss {:.4} | train acc {:.2}% | val acc {:.2}%{}",
            epoch + 1,
            config.epochs,
            epoch_loss.average(),
            train_acc,
            val_metrics.accuracy * 100.0,
            if is_best {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
    }

    let weights = best_weights.ok_or_else(|| {
        GalleryError::Training("No model snapshot was taken during training".into())
    })?;
    Ok((weights, best_val_acc.max(0.0)))
}

/// Run the model over a dataset, returning per-sample probability rows and
/// the matching ground-truth labels.
fn evaluate<B: Backend>(
    model: &GalleryClassifier<B>,
    dataset: &GalleryDataset,
    batcher: &GalleryBatcher,
    batch_size: usize,
    device: &B::Device,
) -> Result<(Vec<Vec<f32>>, Vec<usize>)> {
    let num_classes = model.num_classes();
    let mut probabilities = Vec::with_capacity(dataset.len());
    let mut truths = Vec::with_capacity(dataset.len());

    for start in (0..dataset.len()).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(dataset.len());
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        truths.extend(items.iter().map(|item| item.label));

        let batch = batcher.batch(items, device);
        let probs = model.forward_softmax(batch.images);
        let flat: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| GalleryError::Inference(format!("{:?}", e)))?;
        for row in flat.chunks(num_classes) {
            probabilities.push(row.to_vec());
        }
    }

    Ok((probabilities, truths))
}

/// Classify one sample image with the freshly saved bundle, to show the
/// whole save/load/predict path works end to end. A missing sample folder
/// or an unreadable sample image is an error like in any other stage; an
/// empty folder means there is simply nothing to demonstrate.
fn trial_prediction(config: &TrainerConfig) -> Result<()> {
    let records = load_images_in_memory(&config.sample_images_dir)?;
    let Some(record) = records.into_iter().next() else {
        tracing::info!(
            "No sample images in {:?}, nothing to demonstrate",
            config.sample_images_dir
        );
        return Ok(());
    };

    let engine = PredictionEngine::load(&config.output_model_path)?;
    let prediction = engine.predict(&record)?;
    println!("\n{}", "Trial prediction with the saved model:".cyan());
    println!("  {}", prediction);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend, TrainingBackend};
    use crate::dataset::burn_dataset::GalleryItem;

    fn solid_item(value: f32, label: usize, size: usize) -> GalleryItem {
        GalleryItem {
            image: vec![value; 3 * size * size],
            label,
            name: format!("item_{}.png", label),
        }
    }

    /// Two trivially separable classes (dark vs bright solid images).
    fn toy_datasets(size: usize) -> (GalleryDataset, GalleryDataset) {
        let mut train = Vec::new();
        for i in 0..8 {
            let jitter = i as f32 * 0.01;
            train.push(solid_item(0.1 + jitter, 0, size));
            train.push(solid_item(0.8 + jitter / 4.0, 1, size));
        }
        let val = vec![solid_item(0.12, 0, size), solid_item(0.85, 1, size)];
        (GalleryDataset::new(train), GalleryDataset::new(val))
    }

    #[test]
    fn test_evaluate_shapes() {
        let device = default_device();
        let (_, val) = toy_datasets(8);
        let model = GalleryClassifierConfig::new(2).init::<DefaultBackend>(&device);
        let batcher = GalleryBatcher::new(8);

        let (probs, truths) = evaluate(&model, &val, &batcher, 4, &device).unwrap();
        assert_eq!(probs.len(), 2);
        assert_eq!(truths, vec![0, 1]);
        assert_eq!(probs[0].len(), 2);
        let sum: f32 = probs[0].iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_weight_snapshot_round_trip() {
        let device = default_device();
        let model = GalleryClassifierConfig::new(3).init::<DefaultBackend>(&device);
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let bytes = recorder.record(model.into_record(), ()).unwrap();

        let restored = restore_model::<DefaultBackend>(&bytes, 3, &device).unwrap();
        assert_eq!(restored.num_classes(), 3);
    }

    #[test]
    fn test_train_loop_snapshots_best_model() {
        let device = <TrainingBackend as Backend>::Device::default();
        let (train, val) = toy_datasets(8);
        let codec = LabelCodec::fit(["dark", "bright"]);

        let config = TrainerConfig {
            epochs: 2,
            batch_size: 4,
            image_size: 8,
            ..Default::default()
        };

        let (weights, best_acc) =
            train_loop::<TrainingBackend>(&config, &codec, &train, &val, &device).unwrap();
        assert!(!weights.is_empty());
        assert!((0.0..=1.0).contains(&best_acc));
    }

    #[test]
    fn test_zero_epochs_rejected() {
        let config = TrainerConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_training::<TrainingBackend>(&config),
            Err(GalleryError::Config(_))
        ));
    }
}
