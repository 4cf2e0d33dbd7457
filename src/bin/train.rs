//! Train the motor fault random forest and write the model artifact.
//!
//! Usage:
//!   cargo run --bin train
//!   cargo run --bin train -- --dataset data/ai4i.csv --output model.json --trees 200

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use motor_fault::config::MotorConfig;
use motor_fault::training;

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Fit the motor failure classifier and save the artifact")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cleaned dataset CSV
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where to write the model artifact
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,

    /// Random seed for the split and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of rows withheld for the holdout accuracy
    #[arg(long)]
    holdout: Option<f64>,
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
    if let Some(output) = args.output {
        cfg.paths.model = output;
    }
    if let Some(trees) = args.trees {
        cfg.training.n_trees = trees;
    }
    if let Some(seed) = args.seed {
        cfg.training.seed = seed;
    }
    if let Some(holdout) = args.holdout {
        cfg.training.holdout_fraction = holdout;
    }
    cfg.validate()?;

    let artifact = training::train_from_file(&cfg.paths.dataset, &cfg.paths.model, &cfg.training)
        .with_context(|| format!("Training on {} failed", cfg.paths.dataset.display()))?;

    println!("Model trained and saved as {}", cfg.paths.model.display());
    println!(
        "  trees: {}  training rows: {}  holdout rows: {}",
        artifact.forest.trees().len(),
        artifact.metadata.training_rows,
        artifact.metadata.holdout_rows
    );
    if let Some(acc) = artifact.metadata.holdout_accuracy {
        println!("  holdout accuracy: {acc:.4}");
    }
    Ok(())
}
