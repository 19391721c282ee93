//! Predictor executable.
//!
//! Loads the saved model bundle and classifies every image in a folder,
//! one at a time, printing a line per prediction.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use gallery_classifier::config::PredictorConfig;
use gallery_classifier::inference::run_prediction;
use gallery_classifier::logging::{init_logging, LogConfig};

/// Classify images with a trained gallery classifier
#[derive(Parser, Debug)]
#[command(name = "predict")]
#[command(version)]
#[command(about = "Classify a folder of images with a trained model bundle", long_about = None)]
struct Cli {
    /// Path to the model bundle
    #[arg(short, long, default_value = "assets/inputs/model/image_classifier.tar.gz")]
    model: PathBuf,

    /// Folder of images to classify
    #[arg(short, long, default_value = "assets/inputs/images-for-predictions")]
    images: PathBuf,

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

    let config = PredictorConfig {
        model_path: cli.model,
        images_dir: cli.images,
    };
    run_prediction(&config)?;

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════╗
 ║   Gallery Classifier - Predictor                 ║
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
