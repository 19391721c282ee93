//! Model loading and prediction.

pub mod engine;

pub use engine::{Prediction, PredictionEngine};

use colored::Colorize;

use crate::config::PredictorConfig;
use crate::dataset::loader::load_images_in_memory;
use crate::error::Result;

/// Run the full prediction workflow with the given configuration: load the
/// bundle, read every image in the folder and classify each one, printing a
/// line per prediction. Returns the predictions in input order.
pub fn run_prediction(config: &PredictorConfig) -> Result<Vec<Prediction>> {
    println!("Loading model from {:?}...", config.model_path);
    let engine = PredictionEngine::load(&config.model_path)?;
    println!("  Classes: {}", engine.class_labels().join(", ").cyan());

    let records = load_images_in_memory(&config.images_dir)?;
    if records.is_empty() {
        println!(
            "{} no images found in {:?}",
            "warning:".yellow(),
            config.images_dir
        );
        return Ok(Vec::new());
    }

    println!("\nClassifying {} images:\n", records.len());
    let predictions = engine.predict_all(&records)?;
    for prediction in &predictions {
        prediction.print();
    }

    Ok(predictions)
}
