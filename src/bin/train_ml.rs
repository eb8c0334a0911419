//! Train the up/not-up classifier from an OHLCV CSV file.
//!
//! # Usage
//! ```sh
//! cargo run --bin train_ml -- --input data/btc_1h.csv --output data/ml/model.json
//! ```
//!
//! Classifier defaults come from the `ML_*` environment variables and can be
//! overridden per run with the flags below.

use anyhow::{Context, Result, bail};
use clap::Parser;
use rustsignal::application::ml::feature_builder::FeatureBuilder;
use rustsignal::application::ml::signal_classifier::SignalClassifier;
use rustsignal::config::Config;
use rustsignal::domain::ml::feature_registry::{FEATURE_NAMES, Label};
use rustsignal::infrastructure::market_data::csv_loader::load_series;
use rustsignal::infrastructure::persistence::model_store::ModelStore;
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to OHLCV CSV (timestamp,open,high,low,close,volume)
    #[arg(long, default_value = "data/ohlcv.csv")]
    input: PathBuf,

    /// Path to output model file
    #[arg(long, default_value = "data/ml/model.json")]
    output: PathBuf,

    /// Number of trees in the random forest
    #[arg(long)]
    n_trees: Option<usize>,

    /// Seed for the train/test shuffle and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Share of examples held out for the accuracy report
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Maximum depth of trees
    #[arg(long)]
    max_depth: Option<u16>,

    /// Minimum samples required to split an internal node
    #[arg(long)]
    min_split: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(n) = args.n_trees {
        config.classifier.tree_count = n;
    }
    if let Some(seed) = args.seed {
        config.classifier.random_seed = seed;
    }
    if let Some(fraction) = args.test_fraction {
        config.classifier.test_fraction = fraction;
    }
    if let Some(depth) = args.max_depth {
        config.classifier.max_depth = depth;
    }
    if let Some(min_split) = args.min_split {
        config.classifier.min_samples_split = min_split;
    }

    let buffer = load_series(&args.input)?;
    let builder = FeatureBuilder::new(config.indicators.clone());
    let examples = builder.build_training_set(&buffer);

    if examples.is_empty() {
        bail!(
            "No usable rows in {:?}: {} observations do not cover the indicator warm-up",
            args.input,
            buffer.len()
        );
    }
    let dropped = buffer.len() - examples.len();
    if dropped > 0 {
        warn!("Dropped {} warm-up/unlabeled rows", dropped);
    }

    let n = examples.len();
    let ups = examples.iter().filter(|e| e.label == Label::Up).count();
    println!("\nTarget Distribution (next close > close):");
    println!("  Total:    {}", n);
    println!("  Up:       {} ({:.1}%)", ups, ups as f64 / n as f64 * 100.0);
    println!(
        "  Not up:   {} ({:.1}%)",
        n - ups,
        (n - ups) as f64 / n as f64 * 100.0
    );
    println!("  Features: {}", FEATURE_NAMES.join(", "));
    println!();

    let outcome = SignalClassifier::fit_with_settings(
        &examples,
        &config.classifier,
        config.indicators.feature_settings(),
    )
    .context("Training failed")?;

    println!(
        "OOS Test (n={}): Accuracy={:.4}",
        outcome.report.test_size, outcome.report.accuracy
    );

    let store = ModelStore::new(&args.output);
    store.save(&outcome.model)?;
    info!("Done. Model saved to {:?}", store.path());
    Ok(())
}
