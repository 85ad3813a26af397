//! What-if delay prediction for a single trip, with ranked corrective actions.
//!
//! Run: cargo run --bin predict_delay -- --distance 500 --fuel 100 --weather Heavy_Rain
//!      cargo run --bin predict_delay -- --export corrective_actions.csv

use anyhow::Result;
use clap::Parser;
use delivery_delay::app::AppState;
use delivery_delay::config::AppConfig;
use delivery_delay::export::actions_to_csv;
use delivery_delay::impact::TripInput;
use delivery_delay::logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "predict_delay", about = "Predict delivery delay and suggest corrective actions")]
struct Args {
    /// Distance in km
    #[arg(long, default_value = "500")]
    distance: f64,

    /// Fuel consumption in litres
    #[arg(long, default_value = "100")]
    fuel: f64,

    /// Toll charges in INR
    #[arg(long, default_value = "200")]
    toll: f64,

    /// None, Light_Rain, Heavy_Rain or Fog
    #[arg(long, default_value = "None")]
    weather: String,

    /// Estimated total cost in INR
    #[arg(long, default_value = "2000")]
    cost: f64,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Write the actions to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let config = AppConfig::from_env().with_overrides(args.data_dir, args.model_path);
    let state = AppState::initialize(config)?;

    let input = TripInput {
        distance_km: args.distance,
        fuel_consumption_l: args.fuel,
        toll_charges_inr: args.toll,
        weather: args.weather,
        total_cost_inr: args.cost,
    };
    let forecast = state.forecast(&input)?;

    println!("Predicted delay: {:.2} minutes", forecast.predicted_delay_min);
    println!();
    for action in &forecast.actions {
        println!(
            "[P{}] {} (est. delay reduction {} min, cost impact: {})",
            action.priority, action.title, action.est_delay_reduction_min, action.est_cost_change
        );
        if let Some(details) = &action.details {
            for line in details.lines() {
                println!("      {}", line);
            }
        }
    }

    if let Some(path) = args.export {
        std::fs::write(&path, actions_to_csv(&forecast.actions)?)?;
        println!();
        println!("Wrote {} actions to {}", forecast.actions.len(), path.display());
    }
    Ok(())
}
