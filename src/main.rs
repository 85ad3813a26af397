//! Delivery delay overview report.
//!
//! Run: cargo run --bin delivery_delay -- --data-dir data

use anyhow::Result;
use clap::Parser;
use delivery_delay::app::AppState;
use delivery_delay::config::AppConfig;
use delivery_delay::dashboard::{self, TripFilter, TOP_DELAYED_LIMIT};
use delivery_delay::logging;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "delivery_delay", about = "Print KPIs for the merged delivery data")]
struct Args {
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    model_path: Option<PathBuf>,
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let config = AppConfig::from_env().with_overrides(args.data_dir, args.model_path);

    let state = AppState::initialize(config)?;
    info!("Loaded {} orders", state.trips.num_rows());

    let summary = state.summary(&TripFilter::default())?;
    println!("=== Delivery Analytics Overview ===");
    println!("Orders:              {}", summary.overview.orders);
    println!("Vehicles:            {}", summary.vehicles);
    println!("Avg delay (min):     {}", fmt_opt(summary.overview.avg_delay_min, 2));
    println!("Avg reliability:     {}", fmt_opt(summary.overview.avg_reliability, 3));
    println!("Total cost (INR):    {:.2}", summary.overview.total_cost_inr);
    println!("Avg fuel per km:     {}", fmt_opt(summary.overview.avg_fuel_per_km, 4));
    println!("Model:               {:?}", summary.model);
    println!("Crew:                {}", summary.crew);

    if !summary.advisories.is_empty() {
        println!();
        println!("Advisories:");
        for advisory in &summary.advisories {
            println!("  - {}", advisory);
        }
    }

    println!();
    println!("=== Top Delayed Orders ===");
    let top = dashboard::top_delayed(&state.trips, TOP_DELAYED_LIMIT)?;
    print!("{}", top.to_csv_string()?);

    println!();
    println!("=== Cost Breakdown ===");
    for share in dashboard::cost_breakdown(&state.trips)? {
        println!("  {:<22} {:>14.2}", share.component, share.total_inr);
    }

    let carriers = dashboard::avg_delay_by_carrier(&state.trips)?;
    if !carriers.is_empty() {
        println!();
        println!("=== Average Delay by Carrier ===");
        for group in carriers {
            println!("  {:<22} {:>8.2} min ({} orders)", group.group, group.avg_delay_min, group.orders);
        }
    }

    Ok(())
}
