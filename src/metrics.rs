//! Derived KPIs: total cost, fuel efficiency, delay index and reliability.
//!
//! Missing source columns are synthesised with safe defaults and reported as
//! advisories. Only values that cannot be read as numbers are fatal.

use crate::error::DataError;
use crate::table::Table;
use tracing::warn;

pub const COST_COLUMNS: [&str; 4] = [
    "Fuel_Cost_INR",
    "Labor_Cost_INR",
    "Maintenance_Cost_INR",
    "Toll_Charges_INR",
];

pub const TOTAL_COST: &str = "Total_Cost_INR";
pub const FUEL_PER_KM: &str = "Fuel_per_KM";
pub const DELAY_INDEX: &str = "Delay_Index";
pub const RELIABILITY_SCORE: &str = "Reliability_Score";
pub const DELAY_MINUTES: &str = "Traffic_Delay_Minutes";
pub const DISTANCE_KM: &str = "Distance_KM";
pub const FUEL_LITRES: &str = "Fuel_Consumption_L";

/// Floor on the reliability denominator so an all-zero delay column cannot blow up.
const RELIABILITY_FLOOR: f64 = 0.1;

/// The augmented table and the advisories raised while building it.
#[derive(Debug, Clone)]
pub struct MetricsOutcome {
    pub table: Table,
    pub advisories: Vec<String>,
}

fn advise(advisories: &mut Vec<String>, message: String) {
    warn!("{}", message);
    advisories.push(message);
}

/// Sum that treats missing addends as zero.
pub fn sum_treating_null_as_zero(parts: &[Option<f64>]) -> f64 {
    parts.iter().map(|p| p.unwrap_or(0.0)).sum()
}

/// `numerator / denominator`, missing unless the denominator is present and strictly positive.
pub fn guarded_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

/// Add or overwrite the derived KPI columns.
pub fn compute_metrics(mut table: Table) -> Result<MetricsOutcome, DataError> {
    let rows = table.num_rows();
    let mut advisories = Vec::new();

    let mut cost_values = Vec::with_capacity(COST_COLUMNS.len());
    for column in COST_COLUMNS {
        let values = match table.numeric(column)? {
            Some(values) => values,
            None => {
                advise(
                    &mut advisories,
                    format!("Missing expected column '{}', filling with 0s", column),
                );
                let zeros = vec![Some(0.0); rows];
                table.set_numeric(column, zeros.clone());
                zeros
            }
        };
        cost_values.push(values);
    }
    let total: Vec<Option<f64>> = (0..rows)
        .map(|row| {
            let parts: Vec<Option<f64>> = cost_values.iter().map(|c| c[row]).collect();
            Some(sum_treating_null_as_zero(&parts))
        })
        .collect();
    table.set_numeric(TOTAL_COST, total);

    let fuel = match table.numeric(FUEL_LITRES)? {
        Some(values) => values,
        None => {
            advise(
                &mut advisories,
                format!("Missing '{}', filling with nulls for {}", FUEL_LITRES, FUEL_PER_KM),
            );
            table.set_numeric(FUEL_LITRES, vec![None; rows]);
            vec![None; rows]
        }
    };
    let distance = match table.numeric(DISTANCE_KM)? {
        Some(values) => values,
        None => {
            advise(
                &mut advisories,
                format!("Missing '{}', filling with nulls for {}", DISTANCE_KM, FUEL_PER_KM),
            );
            table.set_numeric(DISTANCE_KM, vec![None; rows]);
            vec![None; rows]
        }
    };
    let fuel_per_km: Vec<Option<f64>> = fuel
        .iter()
        .zip(&distance)
        .map(|(f, d)| guarded_ratio(*f, *d))
        .collect();
    table.set_numeric(FUEL_PER_KM, fuel_per_km);

    let delay = match table.numeric(DELAY_MINUTES)? {
        Some(values) => values,
        None => {
            advise(
                &mut advisories,
                format!("Missing '{}', filling with 0s for {}", DELAY_MINUTES, DELAY_INDEX),
            );
            table.set_numeric(DELAY_MINUTES, vec![Some(0.0); rows]);
            vec![Some(0.0); rows]
        }
    };
    let delay_index: Vec<Option<f64>> = delay.iter().map(|d| d.map(|m| m / 60.0)).collect();

    let peak = delay_index
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let denominator = if peak.is_finite() {
        peak.max(RELIABILITY_FLOOR)
    } else {
        RELIABILITY_FLOOR
    };
    let reliability: Vec<Option<f64>> = delay_index
        .iter()
        .map(|d| d.map(|hours| 1.0 - hours / denominator))
        .collect();

    table.set_numeric(DELAY_INDEX, delay_index);
    table.set_numeric(RELIABILITY_SCORE, reliability);

    Ok(MetricsOutcome { table, advisories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn numbers(t: &Table, column: &str) -> Vec<Option<f64>> {
        t.numeric(column).unwrap().unwrap()
    }

    #[test]
    fn test_total_cost_treats_missing_as_zero() {
        let t = table(
            "Order_ID,Fuel_Cost_INR,Labor_Cost_INR,Maintenance_Cost_INR,Toll_Charges_INR\nA,100,50,,20\n",
        );
        let out = compute_metrics(t).unwrap();
        assert_eq!(numbers(&out.table, TOTAL_COST), vec![Some(170.0)]);
        assert!(out.advisories.iter().all(|a| !a.contains("Cost_INR")));
    }

    #[test]
    fn test_missing_cost_columns_are_synthesised_with_advisory() {
        let t = table("Order_ID,Fuel_Cost_INR\nA,100\nB,\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(numbers(&out.table, TOTAL_COST), vec![Some(100.0), Some(0.0)]);
        assert_eq!(numbers(&out.table, "Labor_Cost_INR"), vec![Some(0.0), Some(0.0)]);
        let cost_advisories = out
            .advisories
            .iter()
            .filter(|a| a.contains("Cost_INR") || a.contains("Toll"))
            .count();
        assert_eq!(cost_advisories, 3);
    }

    #[test]
    fn test_fuel_per_km_guards_division() {
        let t = table("Order_ID,Distance_KM,Fuel_Consumption_L\nA,0,10\nB,,10\nC,-5,10\nD,50,10\nE,20,\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(
            numbers(&out.table, FUEL_PER_KM),
            vec![None, None, None, Some(0.2), None]
        );
    }

    #[test]
    fn test_missing_distance_synthesised_as_null() {
        let t = table("Order_ID,Fuel_Consumption_L\nA,10\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(out.table.get(0, DISTANCE_KM), Some(&Value::Null));
        assert_eq!(out.table.get(0, FUEL_PER_KM), Some(&Value::Null));
        assert!(out.advisories.iter().any(|a| a.contains(DISTANCE_KM)));
    }

    #[test]
    fn test_reliability_is_one_when_no_delays() {
        let t = table("Order_ID,Traffic_Delay_Minutes\nA,0\nB,0\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(numbers(&out.table, RELIABILITY_SCORE), vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_reliability_relative_to_peak_delay() {
        let t = table("Order_ID,Traffic_Delay_Minutes\nA,30\nB,0\nC,15\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(numbers(&out.table, DELAY_INDEX), vec![Some(0.5), Some(0.0), Some(0.25)]);
        let scores = numbers(&out.table, RELIABILITY_SCORE);
        assert_eq!(scores, vec![Some(0.0), Some(1.0), Some(0.5)]);
        assert!(scores.iter().flatten().all(|s| *s <= 1.0));
    }

    #[test]
    fn test_small_delays_use_floor() {
        // peak delay index is 0.05h, below the 0.1 floor
        let t = table("Order_ID,Traffic_Delay_Minutes\nA,3\n");
        let out = compute_metrics(t).unwrap();
        let score = numbers(&out.table, RELIABILITY_SCORE)[0].unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_delay_column_defaults_to_zero() {
        let t = table("Order_ID\nA\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(numbers(&out.table, DELAY_MINUTES), vec![Some(0.0)]);
        assert_eq!(numbers(&out.table, RELIABILITY_SCORE), vec![Some(1.0)]);
        assert!(out.advisories.iter().any(|a| a.contains(DELAY_MINUTES)));
    }

    #[test]
    fn test_non_numeric_cost_is_fatal() {
        let t = table("Order_ID,Fuel_Cost_INR\nA,lots\n");
        assert!(matches!(
            compute_metrics(t),
            Err(DataError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_preserves_rows_and_columns() {
        let t = table("Order_ID,Carrier\nA,X\nB,Y\n");
        let out = compute_metrics(t).unwrap();
        assert_eq!(out.table.num_rows(), 2);
        assert_eq!(out.table.get(1, "Carrier"), Some(&Value::from("Y")));
        assert_eq!(out.table.column_names()[0], "Order_ID");
    }
}
