//! Trainer executable.
//!
//! Trains the photo classifier from a directory-per-class tree, saves the
//! model bundle and copies it next to the predictor. Defaults reproduce the
//! shipped asset layout, so `cargo run --bin train` works with no flags.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use gallery_classifier::backend::TrainingBackend;
use gallery_classifier::config::TrainerConfig;
use gallery_classifier::logging::{init_logging, LogConfig};
use gallery_classifier::training::run_training;
use gallery_classifier::{DEFAULT_SEED, IMAGE_SIZE, VALIDATION_FRACTION};

/// Train the gallery photo classifier
#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(version)]
#[command(about = "Train an image classifier from a directory-per-class photo tree", long_about = None)]
struct Cli {
    /// Root of the directory-per-class training tree
    #[arg(long, default_value = "assets/inputs/images/photos")]
    photos_dir: PathBuf,

    /// Where to write the trained model bundle
    #[arg(long, default_value = "assets/outputs/image_classifier.tar.gz")]
    output: PathBuf,

    /// Where the predictor expects its copy of the bundle
    #[arg(long, default_value = "assets/inputs/model/image_classifier.tar.gz")]
    predictor_model: PathBuf,

    /// Folder of sample images for the post-training trial prediction
    #[arg(long, default_value = "assets/inputs/test-images")]
    sample_images: PathBuf,

    /// Number of training epochs
    #[arg(short, long, default_value = "10")]
    epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "16")]
    batch_size: usize,

    /// Learning rate
    #[arg(short, long, default_value = "0.001")]
    learning_rate: f64,

    /// Fraction of the dataset held out for validation
    #[arg(long, default_value_t = VALIDATION_FRACTION)]
    validation_fraction: f64,

    /// Random seed for shuffling and splitting
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Edge length images are resized to
    #[arg(long, default_value_t = IMAGE_SIZE)]
    image_size: usize,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only show log events from the given target prefix
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            1
        }
    };

    pause();
    std::process::exit(exit_code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Some(prefix) = &cli.log_filter {
        log_config = log_config.with_source_filter(prefix);
    }
    let _ = init_logging(&log_config);

    print_banner();

    let config = TrainerConfig {
        photos_dir: cli.photos_dir,
        output_model_path: cli.output,
        predictor_model_path: cli.predictor_model,
        sample_images_dir: cli.sample_images,
        validation_fraction: cli.validation_fraction,
        seed: cli.seed,
        epochs: cli.epochs,
        batch_size: cli.batch_size,
        learning_rate: cli.learning_rate,
        image_size: cli.image_size,
    };

    run_training::<TrainingBackend>(&config)?;
    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════╗
 ║   Gallery Classifier - Trainer                   ║
 ║   Photo classification with Burn + Rust          ║
 ╚══════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn pause() {
    println!("\nPress Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
