//! Offline trainer for the Heartcheck risk model.
//!
//! Reads the labelled `heart.csv`, fits the standardize-then-logistic
//! pipeline and writes the JSON artifact the application loads at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train_model -- --data heart.csv --output models/heart_disease_model.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use heartcheck::adapters::{load_dataset, save_model};
use heartcheck::config::DEFAULT_MODEL_PATH;
use heartcheck::domain::training::{self, DEFAULT_C, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use heartcheck::domain::TrainingOptions;

#[derive(Debug, Parser)]
#[command(
    name = "train_model",
    version,
    about = "Fit the heart disease risk model from a labelled CSV"
)]
struct Cli {
    /// Labelled dataset with the 13 feature columns and `target`
    #[arg(long, short = 'd', default_value = "heart.csv")]
    data: PathBuf,

    /// Where to write the model artifact
    #[arg(long, short = 'o', env = "HEARTCHECK_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    output: PathBuf,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Share of rows held out for the accuracy check
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Inverse L2 regularization strength
    #[arg(long, default_value_t = DEFAULT_C)]
    c: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let dataset = load_dataset(&cli.data)
        .with_context(|| format!("reading dataset {}", cli.data.display()))?;
    let rows = dataset.samples.len();

    let options = TrainingOptions {
        seed: cli.seed,
        test_fraction: cli.test_fraction,
        c: cli.c,
    };
    let outcome = training::train(dataset.samples, &options).context("fitting model")?;
    if !outcome.converged {
        tracing::warn!("Solver stopped after {} iterations", outcome.iterations);
    }

    let mut pipeline = outcome.pipeline;
    pipeline.metadata.trained_at = chrono::Utc::now().to_rfc3339();
    pipeline.metadata.dataset_sha256 = dataset.sha256;

    save_model(&cli.output, &pipeline)
        .with_context(|| format!("writing model to {}", cli.output.display()))?;

    println!("Model trained on {rows} rows and saved to {}", cli.output.display());
    println!(
        "  train/test: {}/{}  held-out accuracy: {:.4}",
        pipeline.metadata.train_rows, pipeline.metadata.test_rows, pipeline.metadata.test_accuracy
    );
    Ok(())
}
