//! Synthetic corpus generator.
//!
//! Writes `synthetic_patients.json` and a flattened `synthetic_patients.csv`.
//!
//! Usage:
//!   generate_data [--count <n>] [--seed <seed>] [--output-dir <dir>]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dxassist::adapters::sanitize::SanitizingMakeWriter;
use dxassist::synthetic::{self, corpus};

#[derive(Parser)]
#[command(name = "generate_data")]
#[command(version)]
#[command(about = "Generate a labeled synthetic patient corpus", long_about = None)]
struct Cli {
    /// Number of records
    #[arg(short = 'n', long, default_value_t = 1000)]
    count: usize,

    /// Random seed; the same seed reproduces the same corpus
    #[arg(long, default_value_t = synthetic::DEFAULT_SEED)]
    seed: u64,

    /// Directory receiving the JSON and CSV files
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(std::io::stderr)))
        .init();

    let cli = Cli::parse();

    let records = synthetic::generate_at(cli.count, cli.seed, chrono::Utc::now());

    let json_path = cli.output_dir.join(corpus::CORPUS_JSON);
    corpus::save_json(&records, &json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    let csv_path = cli.output_dir.join(corpus::CORPUS_CSV);
    corpus::save_csv(&records, &csv_path)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    let mut counts = std::collections::BTreeMap::<&str, usize>::new();
    for label in records.iter().filter_map(|r| r.label()) {
        *counts.entry(label).or_default() += 1;
    }

    println!("Generated {} records (seed {})", records.len(), cli.seed);
    println!("  {}", json_path.display());
    println!("  {}", csv_path.display());
    println!("Diseases:");
    for (disease, count) in &counts {
        println!("  {disease:<28} {count}");
    }
    Ok(())
}
