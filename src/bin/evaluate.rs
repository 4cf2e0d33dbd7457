//! Evaluate a trained model artifact against a labeled dataset.
//!
//! Prints accuracy, the classification report, TP/FP/TN/FN, and text
//! renderings of the confusion matrix and ROC curve.
//!
//! Usage:
//!   cargo run --bin evaluate
//!   cargo run --bin evaluate -- --model model.json --report eval.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use motor_fault::config::MotorConfig;
use motor_fault::dataset::Dataset;
use motor_fault::evaluation::{self, render};
use motor_fault::forest;

#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(about = "Score the motor failure classifier on a labeled dataset")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Labeled dataset CSV
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Model artifact to evaluate
    #[arg(long)]
    model: Option<PathBuf>,

    /// Write the full evaluation as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// ROC chart width in characters
    #[arg(long, default_value = "60")]
    width: usize,

    /// ROC chart height in lines
    #[arg(long, default_value = "20")]
    height: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => MotorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MotorConfig::load(),
    };
    if let Some(dataset) = args.dataset {
        cfg.paths.dataset = dataset;
    }
    if let Some(model) = args.model {
        cfg.paths.model = model;
    }

    let artifact = forest::load_from_disk(&cfg.paths.model)
        .with_context(|| format!("Failed to load model {}", cfg.paths.model.display()))?;
    let dataset = Dataset::load(&cfg.paths.dataset)
        .with_context(|| format!("Failed to load dataset {}", cfg.paths.dataset.display()))?;

    let eval = evaluation::evaluate(&artifact.forest, &dataset)?;

    println!("Accuracy: {:.4}", eval.accuracy);
    println!();
    println!("Classification Report:");
    println!("{}", eval.report);
    println!(
        "TP: {}, FP: {}, TN: {}, FN: {}",
        eval.confusion.true_positives(),
        eval.confusion.false_positives(),
        eval.confusion.true_negatives(),
        eval.confusion.false_negatives()
    );
    println!();
    print!("{}", render::render_confusion_matrix(&eval.confusion));
    println!();
    print!("{}", render::render_roc(&eval.roc, args.width, args.height));

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&eval)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!();
        println!("Report written to {}", path.display());
    }
    Ok(())
}
