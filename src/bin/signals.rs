//! Decide signals over an OHLCV CSV file with a trained model.
//!
//! # Usage
//! ```sh
//! cargo run --bin signals -- --input data/btc_5m.csv --model data/ml/model.json --export out.csv
//! ```
//!
//! Thresholds and indicator periods come from the environment (see `.env`).

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use rustsignal::application::market_data::indicator_frame::IndicatorFrame;
use rustsignal::application::market_data::signal_engine::SignalEngine;
use rustsignal::config::Config;
use rustsignal::domain::market::series_buffer::SeriesBuffer;
use rustsignal::domain::trading::types::{SignalDecision, SignalSummary};
use rustsignal::infrastructure::market_data::csv_loader::load_series;
use rustsignal::infrastructure::persistence::model_store::ModelStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to OHLCV CSV (timestamp,open,high,low,close,volume)
    #[arg(long, default_value = "data/ohlcv.csv")]
    input: PathBuf,

    /// Path to a model written by train_ml
    #[arg(long, default_value = "data/ml/model.json")]
    model: PathBuf,

    /// Write indicators and decisions for every row to this CSV
    #[arg(long)]
    export: Option<PathBuf>,

    /// Number of most recent decisions to print
    #[arg(long, default_value_t = 20)]
    tail: usize,
}

#[derive(Serialize)]
struct ExportRow {
    timestamp: i64,
    datetime: String,
    close: f64,
    volume: f64,
    rsi: Option<f64>,
    sma_20: Option<f64>,
    sma_50: Option<f64>,
    ema_20: Option<f64>,
    ema_50: Option<f64>,
    macd: Option<f64>,
    macd_signal: Option<f64>,
    macd_hist: Option<f64>,
    bb_upper: Option<f64>,
    bb_middle: Option<f64>,
    bb_lower: Option<f64>,
    volume_sma: Option<f64>,
    up_probability: Option<f64>,
    enter_long: Option<bool>,
    exit_long: Option<bool>,
    signal: String,
}

fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn export_rows(
    path: &Path,
    buffer: &SeriesBuffer,
    frame: &IndicatorFrame,
    decisions: &[Option<SignalDecision>],
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;

    for (i, (obs, decision)) in buffer.as_slice().iter().zip(decisions).enumerate() {
        writer.serialize(ExportRow {
            timestamp: obs.timestamp,
            datetime: format_timestamp(obs.timestamp),
            close: obs.close,
            volume: obs.volume,
            rsi: frame.rsi.get(i),
            sma_20: frame.sma_fast.get(i),
            sma_50: frame.sma_slow.get(i),
            ema_20: frame.ema_fast.get(i),
            ema_50: frame.ema_slow.get(i),
            macd: frame.macd.line.get(i),
            macd_signal: frame.macd.signal.get(i),
            macd_hist: frame.macd.histogram.get(i),
            bb_upper: frame.bollinger.upper.get(i),
            bb_middle: frame.bollinger.middle.get(i),
            bb_lower: frame.bollinger.lower.get(i),
            volume_sma: frame.volume_sma.get(i),
            up_probability: decision.map(|d| d.up_probability),
            enter_long: decision.map(|d| d.entry),
            exit_long: decision.map(|d| d.exit),
            signal: decision
                .map(|d| d.signal.to_string())
                .unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    info!("Exported {} rows to {:?}", decisions.len(), path);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let buffer = load_series(&args.input)?;
    let model = ModelStore::new(&args.model).load()?;
    let engine = SignalEngine::from_config(&config);

    let decisions = engine
        .explain_all(&buffer, &model)
        .context("Signal evaluation failed")?;
    let signals: Vec<_> = decisions.iter().map(|d| d.map(|d| d.signal)).collect();
    let summary = SignalSummary::from_signals(&signals);

    let start = buffer.len().saturating_sub(args.tail);
    println!("\n  {:<20} {:>12} {:>8} {:<10}", "Time", "Close", "P(up)", "Signal");
    for (obs, decision) in buffer.as_slice()[start..].iter().zip(&decisions[start..]) {
        match decision {
            Some(d) => println!(
                "  {:<20} {:>12.4} {:>8.3} {:<10}",
                format_timestamp(obs.timestamp),
                obs.close,
                d.up_probability,
                d.signal.to_string()
            ),
            None => println!(
                "  {:<20} {:>12.4} {:>8} {:<10}",
                format_timestamp(obs.timestamp),
                obs.close,
                "-",
                "warm-up"
            ),
        }
    }

    println!("\n  Signals over {} rows:", summary.total());
    println!("    ENTER_LONG: {}", summary.enter_long);
    println!("    EXIT_LONG:  {}", summary.exit_long);
    println!("    NEUTRAL:    {}", summary.neutral);
    println!("    warm-up:    {}\n", summary.undefined);

    if let Some(path) = &args.export {
        let frame = IndicatorFrame::compute(buffer.as_slice(), &config.indicators);
        export_rows(path, &buffer, &frame, &decisions)?;
    }

    Ok(())
}
