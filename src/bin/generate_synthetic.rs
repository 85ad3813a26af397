//! Synthetic data generator for the delivery delay dashboard
//!
//! Writes the five CSV inputs (orders, delivery performance, routes, costs and
//! fleet) with controlled random variation. Delay minutes follow distance and
//! weather so the trained model has something to learn.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --orders <N>         Number of orders (default: 200)
//!   --vehicles <N>       Fleet size (default: 25)
//!   --missing-rate <F>   Probability an order has no route/cost row (default: 0.05)
//!   --seed <N>           Random seed for reproducibility (optional)
//!   --output-dir <PATH>  Output directory (default: data)

use chrono::{Duration, NaiveDate};
use clap::Parser;
use csv::WriterBuilder;
use delivery_delay::loader::{COSTS_FILE, DELIVERY_FILE, FLEET_FILE, ORDERS_FILE, ROUTES_FILE};
use delivery_delay::model::weather::Weather;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Synthetic data generator for the delivery datasets
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate synthetic delivery datasets")]
struct Args {
    /// Number of orders to generate
    #[arg(long, default_value = "200")]
    orders: usize,

    /// Number of vehicles in the fleet file
    #[arg(long, default_value = "25")]
    vehicles: usize,

    /// Probability that an order has no route or cost row (0.0 - 1.0)
    #[arg(long, default_value = "0.05")]
    missing_rate: f64,

    /// First order date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    start_date: NaiveDate,

    /// Number of days the order dates span
    #[arg(long, default_value = "90")]
    days: i64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,
}

const CARRIERS: [&str; 5] = ["SpeedyLogistics", "QuickShip", "GlobalTransit", "ReliableExpress", "EcoDeliver"];
const PRIORITIES: [&str; 3] = ["Express", "Standard", "Economy"];
const CITIES: [&str; 8] = ["Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata", "Hyderabad", "Pune", "Ahmedabad"];
const VEHICLE_TYPES: [&str; 4] = ["Large_Truck", "Medium_Truck", "Small_Van", "Refrigerated"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OrderRow {
    #[serde(rename = "Order_ID")]
    order_id: String,
    #[serde(rename = "Order_Date")]
    order_date: String,
    priority: String,
    origin: String,
    destination: String,
    #[serde(rename = "Order_Value_INR")]
    order_value_inr: f64,
}

#[derive(Debug, Serialize)]
struct DeliveryRow {
    #[serde(rename = "Order_ID")]
    order_id: String,
    #[serde(rename = "Carrier")]
    carrier: String,
    #[serde(rename = "Promised_Delivery_Days")]
    promised_days: u32,
    #[serde(rename = "Actual_Delivery_Days")]
    actual_days: u32,
    #[serde(rename = "Customer_Rating")]
    customer_rating: u8,
}

#[derive(Debug, Serialize)]
struct RouteRow {
    #[serde(rename = "Order_ID")]
    order_id: String,
    #[serde(rename = "Route")]
    route: String,
    #[serde(rename = "Distance_KM")]
    distance_km: f64,
    #[serde(rename = "Fuel_Consumption_L")]
    fuel_consumption_l: Option<f64>,
    #[serde(rename = "Toll_Charges_INR")]
    toll_charges_inr: f64,
    #[serde(rename = "Traffic_Delay_Minutes")]
    traffic_delay_minutes: f64,
    #[serde(rename = "Weather_Impact")]
    weather_impact: String,
}

#[derive(Debug, Serialize)]
struct CostRow {
    #[serde(rename = "Order_ID")]
    order_id: String,
    #[serde(rename = "Fuel_Cost_INR")]
    fuel_cost_inr: f64,
    #[serde(rename = "Labor_Cost_INR")]
    labor_cost_inr: f64,
    #[serde(rename = "Maintenance_Cost_INR")]
    maintenance_cost_inr: f64,
}

#[derive(Debug, Serialize)]
struct VehicleRow {
    #[serde(rename = "Vehicle_ID")]
    vehicle_id: String,
    #[serde(rename = "Vehicle_Type")]
    vehicle_type: String,
    #[serde(rename = "Fuel_Efficiency_KM_per_L")]
    fuel_efficiency: f64,
    #[serde(rename = "Age_Years")]
    age_years: u8,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn pick<'a>(options: &[&'a str], rng: &mut impl Rng) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// Weather is mostly clear.
fn pick_weather(rng: &mut impl Rng) -> Weather {
    match rng.gen_range(0..10) {
        0..=5 => Weather::None,
        6 | 7 => Weather::LightRain,
        8 => Weather::HeavyRain,
        _ => Weather::Fog,
    }
}

/// Delay grows with distance, weather severity and a per-carrier offset.
fn delay_minutes(distance_km: f64, weather: Weather, carrier_idx: usize, rng: &mut impl Rng) -> f64 {
    let noise: f64 = rng.gen_range(-10.0..10.0);
    let base = 0.04 * distance_km + 15.0 * f64::from(weather.code()) + 4.0 * carrier_idx as f64;
    round2((base + noise).max(0.0))
}

fn writer_for(dir: &Path, file: &str) -> Result<csv::Writer<std::fs::File>, Box<dyn Error>> {
    Ok(WriterBuilder::new().has_headers(true).from_path(dir.join(file))?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("🔧 Synthetic Delivery Data Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output dir:       {}", args.output_dir.display());
    println!("Orders:           {}", args.orders);
    println!("Vehicles:         {}", args.vehicles);
    println!("Missing rate:     {:.1}%", args.missing_rate * 100.0);
    println!("Dates:            {} + {} days", args.start_date, args.days);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    // Initialize RNG
    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&args.output_dir)?;

    let mut orders = writer_for(&args.output_dir, ORDERS_FILE)?;
    let mut delivery = writer_for(&args.output_dir, DELIVERY_FILE)?;
    let mut routes = writer_for(&args.output_dir, ROUTES_FILE)?;
    let mut costs = writer_for(&args.output_dir, COSTS_FILE)?;
    let mut fleet = writer_for(&args.output_dir, FLEET_FILE)?;

    let mut route_rows = 0;
    let mut cost_rows = 0;

    for i in 0..args.orders {
        let order_id = format!("ORD{:06}", i + 1);
        let origin = pick(&CITIES, &mut rng);
        let destination = pick(&CITIES, &mut rng);
        let order_date = args.start_date + Duration::days(rng.gen_range(0..args.days.max(1)));

        orders.serialize(OrderRow {
            order_id: order_id.clone(),
            order_date: order_date.format("%Y-%m-%d").to_string(),
            priority: pick(&PRIORITIES, &mut rng).to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            order_value_inr: round2(rng.gen_range(500.0..50_000.0)),
        })?;

        let carrier_idx = rng.gen_range(0..CARRIERS.len());
        let promised_days = rng.gen_range(1..=7);
        delivery.serialize(DeliveryRow {
            order_id: order_id.clone(),
            carrier: CARRIERS[carrier_idx].to_string(),
            promised_days,
            actual_days: promised_days + rng.gen_range(0..=3),
            customer_rating: rng.gen_range(1..=5),
        })?;

        if rng.gen::<f64>() >= args.missing_rate {
            let distance_km = round2(rng.gen_range(20.0..2500.0));
            let weather = pick_weather(&mut rng);
            // occasionally leave fuel blank so the loader's mean fill is exercised
            let fuel = (rng.gen::<f64>() >= args.missing_rate)
                .then(|| round2(distance_km * rng.gen_range(0.08..0.35)));
            routes.serialize(RouteRow {
                order_id: order_id.clone(),
                route: format!("{}-{}", origin, destination),
                distance_km,
                fuel_consumption_l: fuel,
                toll_charges_inr: round2(rng.gen_range(0.0..1500.0)),
                traffic_delay_minutes: delay_minutes(distance_km, weather, carrier_idx, &mut rng),
                weather_impact: weather.label().to_string(),
            })?;
            route_rows += 1;
        }

        if rng.gen::<f64>() >= args.missing_rate {
            costs.serialize(CostRow {
                order_id,
                fuel_cost_inr: round2(rng.gen_range(200.0..8000.0)),
                labor_cost_inr: round2(rng.gen_range(300.0..5000.0)),
                maintenance_cost_inr: round2(rng.gen_range(50.0..1500.0)),
            })?;
            cost_rows += 1;
        }
    }

    for v in 0..args.vehicles {
        fleet.serialize(VehicleRow {
            vehicle_id: format!("VEH{:03}", v + 1),
            vehicle_type: pick(&VEHICLE_TYPES, &mut rng).to_string(),
            fuel_efficiency: round2(rng.gen_range(3.0..14.0)),
            age_years: rng.gen_range(0..12),
        })?;
    }

    for writer in [&mut orders, &mut delivery, &mut routes, &mut costs, &mut fleet] {
        writer.flush()?;
    }

    println!("✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Orders:            {:>8}", args.orders);
    println!("Route rows:        {:>8}", route_rows);
    println!("Cost rows:         {:>8}", cost_rows);
    println!("Vehicles:          {:>8}", args.vehicles);

    Ok(())
}
