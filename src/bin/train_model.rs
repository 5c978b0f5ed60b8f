//! Offline model training.
//!
//! Trains on a JSON corpus (or a freshly generated one) and writes the model
//! artifacts the server loads at startup.
//!
//! Usage:
//!   train_model [--data <corpus.json>] [--generate <n>] [--model-dir <dir>]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dxassist::adapters::sanitize::SanitizingMakeWriter;
use dxassist::application::train_and_save;
use dxassist::ml::BoostingParams;
use dxassist::synthetic::{self, corpus};

#[derive(Parser)]
#[command(name = "train_model")]
#[command(version)]
#[command(about = "Train the disease classifier and save its artifacts", long_about = None)]
struct Cli {
    /// Labeled corpus in JSON; defaults to data/synthetic_patients.json
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Ignore any corpus on disk and train on this many generated records
    #[arg(short, long)]
    generate: Option<usize>,

    /// Artifact directory
    #[arg(short, long, default_value = "data/model")]
    model_dir: PathBuf,

    /// Boosting rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Shrinkage per round
    #[arg(long)]
    learning_rate: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(std::io::stderr)))
        .init();

    let cli = Cli::parse();

    let records = match (cli.generate, &cli.data) {
        (Some(n), _) => synthetic::generate(n),
        (None, Some(path)) => corpus::load_json(path)
            .with_context(|| format!("Failed to read corpus {}", path.display()))?,
        (None, None) => {
            let path = PathBuf::from("data").join(corpus::CORPUS_JSON);
            if path.exists() {
                corpus::load_json(&path)
                    .with_context(|| format!("Failed to read corpus {}", path.display()))?
            } else {
                tracing::info!("No corpus at {}; generating one", path.display());
                synthetic::generate(dxassist::config::DEFAULT_SEED_COUNT)
            }
        }
    };

    let defaults = BoostingParams::default();
    let params = BoostingParams {
        n_rounds: cli.rounds.unwrap_or(defaults.n_rounds),
        max_depth: cli.max_depth.unwrap_or(defaults.max_depth),
        learning_rate: cli.learning_rate.unwrap_or(defaults.learning_rate),
        ..defaults
    };
    params
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid training parameters: {e}"))?;

    let (_, report) = train_and_save(&records, &params, &cli.model_dir)
        .context("Training failed")?;

    println!("Model saved to {}", cli.model_dir.display());
    println!("  samples:  {}", report.n_samples);
    println!("  classes:  {}", report.n_classes);
    println!("  accuracy: {:.4}", report.accuracy);
    Ok(())
}
