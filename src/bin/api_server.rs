//! REST API server for the delivery delay dashboard
//!
//! Usage:
//!   ./target/release/api_server [options]
//!
//! Options:
//!   --port PORT          Port to listen on (default: 8080)
//!   --data-dir DIR       Directory with the five CSV inputs (default: $DELAY_DATA_DIR or data)
//!   --model-path PATH    Model artifact (default: $DELAY_MODEL_PATH or model.json)
//!
//! Endpoints:
//!   GET  /api/v1/health                     - Health check
//!   GET  /api/v1/overview                   - KPIs, model source, advisories
//!   GET  /api/v1/trips                      - Filtered trips (?limit=N)
//!   GET  /api/v1/trips/export               - Filtered trips as CSV
//!   GET  /api/v1/analytics/top-delayed      - Most delayed orders
//!   GET  /api/v1/analytics/cost-breakdown   - Cost component totals
//!   GET  /api/v1/analytics/carriers         - Average delay by carrier
//!   GET  /api/v1/analytics/timeline         - Average delay by order date
//!   GET  /api/v1/analytics/histogram        - Delay distribution (?bins=N)
//!   POST /api/v1/predict                    - Predicted delay and ranked actions
//!   POST /api/v1/actions/export             - Ranked actions as CSV
//!   POST /api/v1/refresh                    - Reload data and model
//!
//! Filters: ?carrier=A,B&weather=Fog&priority=Express&from=2024-01-01&to=2024-01-31

use anyhow::Result;
use clap::Parser;
use delivery_delay::api::{create_router, DashboardService};
use delivery_delay::config::AppConfig;
use delivery_delay::logging;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "api_server", about = "Serve the delivery delay dashboard API")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Directory containing the CSV inputs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Model artifact path
    #[arg(long)]
    model_path: Option<PathBuf>,
}

fn print_banner(port: u16, config: &AppConfig) {
    println!("============================================================");
    println!("         DELIVERY DELAY DASHBOARD API SERVER");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  REST:     http://localhost:{}/api/v1/", port);
    println!("  Data:     {}", config.data_dir.display());
    println!("  Model:    {}", config.model_path.display());
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/v1/health                    Health check");
    println!("  GET  /api/v1/overview                  KPIs");
    println!("  GET  /api/v1/trips                     Filtered trips");
    println!("  GET  /api/v1/trips/export              Trips CSV");
    println!("  GET  /api/v1/analytics/top-delayed     Top delayed orders");
    println!("  GET  /api/v1/analytics/cost-breakdown  Cost breakdown");
    println!("  GET  /api/v1/analytics/carriers        Delay by carrier");
    println!("  GET  /api/v1/analytics/timeline        Delay over time");
    println!("  GET  /api/v1/analytics/histogram       Delay distribution");
    println!("  POST /api/v1/predict                   Predict + actions");
    println!("  POST /api/v1/actions/export            Actions CSV");
    println!("  POST /api/v1/refresh                   Reload state");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();
    let config = AppConfig::from_env().with_overrides(args.data_dir, args.model_path);

    print_banner(args.port, &config);

    let service = Arc::new(DashboardService::start(config).await?);
    let app = create_router(service);

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
