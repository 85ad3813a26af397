//! Offline training: fit the delay model on the merged data and overwrite the artifact.
//!
//! Run: cargo run --bin train -- --data-dir data --model-path model.json

use anyhow::{bail, Result};
use clap::Parser;
use delivery_delay::config::AppConfig;
use delivery_delay::loader::DataSources;
use delivery_delay::logging;
use delivery_delay::model::artifact::save_artifact;
use delivery_delay::model::training::{fit_delay_model, holdout_r2, training_table, MIN_TRAINING_ROWS};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the delivery delay model")]
struct Args {
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    /// Shuffle seed for the hold-out split
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let config = AppConfig::from_env().with_overrides(args.data_dir, args.model_path);

    let trips = training_table(&DataSources::in_dir(&config.data_dir))?;
    info!("Training on {} rows", trips.num_rows());

    match holdout_r2(&trips, args.test_fraction, args.seed)? {
        Some(r2) => println!("Hold-out R² ({:.0}% test, seed {}): {:.4}", args.test_fraction * 100.0, args.seed, r2),
        None => println!("Not enough rows for a hold-out split"),
    }

    let Some(report) = fit_delay_model(&trips)? else {
        bail!("need at least {} rows to train, found {}", MIN_TRAINING_ROWS, trips.num_rows());
    };
    save_artifact(&config.model_path, &report.model)?;

    println!("Training R²: {:.4} over {} rows", report.r2, report.rows);
    println!("Saved model to {}", config.model_path.display());
    Ok(())
}
