//! Loads the five CSV sources and left-joins them into one trip table.

use crate::error::DataError;
use crate::table::{Table, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ORDER_ID: &str = "Order_ID";

pub const ORDERS_FILE: &str = "orders.csv";
pub const DELIVERY_FILE: &str = "delivery_performance.csv";
pub const ROUTES_FILE: &str = "routes_distance.csv";
pub const COSTS_FILE: &str = "cost_breakdown.csv";
pub const FLEET_FILE: &str = "vehicle_fleet.csv";

/// Paths of the five input files.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub orders: PathBuf,
    pub delivery: PathBuf,
    pub routes: PathBuf,
    pub costs: PathBuf,
    pub fleet: PathBuf,
}

impl DataSources {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            orders: dir.join(ORDERS_FILE),
            delivery: dir.join(DELIVERY_FILE),
            routes: dir.join(ROUTES_FILE),
            costs: dir.join(COSTS_FILE),
            fleet: dir.join(FLEET_FILE),
        }
    }
}

/// The merged trip table plus the fleet table, which is loaded but never joined.
#[derive(Debug, Clone)]
pub struct MergedData {
    pub trips: Table,
    pub fleet: Table,
}

fn read_required(path: &Path) -> Result<Table, DataError> {
    if !path.exists() {
        return Err(DataError::MissingDataFile {
            path: path.to_path_buf(),
        });
    }
    let table = Table::read_csv(path)?;
    debug!(path = %path.display(), rows = table.num_rows(), "Loaded source");
    Ok(table)
}

fn ensure_unique_keys(table: &Table, source_name: &str) -> Result<(), DataError> {
    let keys = table
        .column(ORDER_ID)
        .ok_or_else(|| DataError::MissingKeyColumn {
            source_name: source_name.to_string(),
            column: ORDER_ID.to_string(),
        })?;
    let mut seen = HashSet::new();
    for key in keys.iter().filter_map(Value::key) {
        if !seen.insert(key.clone()) {
            return Err(DataError::DuplicateKey {
                source_name: source_name.to_string(),
                key,
            });
        }
    }
    Ok(())
}

/// Load every source and left-join them onto the orders table.
pub fn load_and_merge(sources: &DataSources) -> Result<MergedData, DataError> {
    let orders = read_required(&sources.orders)?;
    let delivery = read_required(&sources.delivery)?;
    let routes = read_required(&sources.routes)?;
    let costs = read_required(&sources.costs)?;
    let fleet = read_required(&sources.fleet)?;

    ensure_unique_keys(&orders, ORDERS_FILE)?;

    let mut trips = orders
        .left_join(&delivery, ORDER_ID, DELIVERY_FILE)?
        .left_join(&routes, ORDER_ID, ROUTES_FILE)?
        .left_join(&costs, ORDER_ID, COSTS_FILE)?;

    apply_default_fills(&mut trips)?;

    info!(
        orders = trips.num_rows(),
        columns = trips.column_names().len(),
        vehicles = fleet.num_rows(),
        "Merged delivery datasets"
    );

    Ok(MergedData { trips, fleet })
}

/// Fill missing values only in columns that survived the merge.
pub fn apply_default_fills(trips: &mut Table) -> Result<(), DataError> {
    trips.fill_null("Traffic_Delay_Minutes", &Value::Number(0.0));
    trips.fill_null("Weather_Impact", &Value::from("None"));
    if let Some(fuel) = trips.numeric("Fuel_Consumption_L")? {
        let present: Vec<f64> = fuel.iter().flatten().copied().collect();
        if !present.is_empty() {
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            trips.fill_null("Fuel_Consumption_L", &Value::Number(mean));
        }
    }
    trips.fill_null("Toll_Charges_INR", &Value::Number(0.0));
    Ok(())
}

/// Parse `Order_Date` for every row.
///
/// Returns `None` when the column is absent or any non-null value fails to parse,
/// which disables date-based filtering and timelines.
pub fn parse_order_dates(trips: &Table) -> Option<Vec<Option<NaiveDate>>> {
    let column = trips.column("Order_Date")?;
    column
        .iter()
        .map(|value| match value {
            Value::Null => Some(None),
            other => parse_date(&other.to_string()).map(Some),
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sources(dir: &Path) {
        fs::write(
            dir.join(ORDERS_FILE),
            "Order_ID,Order_Date,Carrier,Priority\nA,2024-01-05,BlueDart,Express\nB,2024-01-06,Ecom,Standard\nC,2024-01-07,BlueDart,Economy\n",
        )
        .unwrap();
        fs::write(
            dir.join(DELIVERY_FILE),
            "Order_ID,Traffic_Delay_Minutes,Weather_Impact\nA,30,Heavy_Rain\nB,,\n",
        )
        .unwrap();
        fs::write(
            dir.join(ROUTES_FILE),
            "Order_ID,Route,Distance_KM,Fuel_Consumption_L,Toll_Charges_INR\nA,R1,100,10,\nB,R2,200,,50\nC,R1,300,20,20\n",
        )
        .unwrap();
        fs::write(dir.join(COSTS_FILE), "Order_ID,Fuel_Cost_INR\nA,100\n").unwrap();
        fs::write(dir.join(FLEET_FILE), "Vehicle_ID,Vehicle_Type\nV1,Truck\n").unwrap();
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        fs::remove_file(dir.path().join(ROUTES_FILE)).unwrap();

        let err = load_and_merge(&DataSources::in_dir(dir.path())).unwrap_err();
        match err {
            DataError::MissingDataFile { path } => assert!(path.ends_with(ROUTES_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_applies_default_fills() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let merged = load_and_merge(&DataSources::in_dir(dir.path())).unwrap();
        let trips = &merged.trips;

        assert_eq!(trips.num_rows(), 3);
        assert_eq!(merged.fleet.num_rows(), 1);
        assert_eq!(trips.get(1, "Traffic_Delay_Minutes"), Some(&Value::Number(0.0)));
        assert_eq!(trips.get(2, "Traffic_Delay_Minutes"), Some(&Value::Number(0.0)));
        assert_eq!(trips.get(1, "Weather_Impact"), Some(&Value::from("None")));
        // mean of 10 and 20
        assert_eq!(trips.get(1, "Fuel_Consumption_L"), Some(&Value::Number(15.0)));
        assert_eq!(trips.get(0, "Toll_Charges_INR"), Some(&Value::Number(0.0)));
        // cost columns absent from all sources stay absent
        assert!(!trips.has_column("Labor_Cost_INR"));
        assert_eq!(trips.get(1, "Fuel_Cost_INR"), Some(&Value::Null));
    }

    #[test]
    fn test_duplicate_anchor_ids_rejected() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        fs::write(dir.path().join(ORDERS_FILE), "Order_ID\nA\nA\n").unwrap();
        let err = load_and_merge(&DataSources::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, DataError::DuplicateKey { .. }));
    }

    #[test]
    fn test_parse_order_dates() {
        let t = Table::from_reader("Order_ID,Order_Date\nA,2024-01-05\nB,\nC,2024-02-01 10:00:00\n".as_bytes()).unwrap();
        let dates = parse_order_dates(&t).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(dates[1], None);
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 2, 1));

        let bad = Table::from_reader("Order_Date\nsoon\n".as_bytes()).unwrap();
        assert!(parse_order_dates(&bad).is_none());
    }
}
