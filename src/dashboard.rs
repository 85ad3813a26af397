//! Filters and aggregations behind the dashboard views.
//!
//! Everything here is a pure function of a (possibly filtered) trip table.

use crate::error::DataError;
use crate::loader::{parse_order_dates, ORDER_ID};
use crate::metrics::{COST_COLUMNS, DELAY_MINUTES, DISTANCE_KM, FUEL_PER_KM, RELIABILITY_SCORE, TOTAL_COST};
use crate::model::weather::WEATHER_LABEL;
use crate::table::{Table, Value};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const CARRIER: &str = "Carrier";
pub const PRIORITY: &str = "Priority";
pub const ROUTE: &str = "Route";

pub const TOP_DELAYED_LIMIT: usize = 10;
pub const HISTOGRAM_BINS: usize = 30;
pub const MAX_HISTOGRAM_BINS: usize = 1000;

const TOP_DELAYED_COLUMNS: [&str; 5] = [ORDER_ID, ROUTE, DISTANCE_KM, DELAY_MINUTES, TOTAL_COST];

// ============================================================================
// Filtering
// ============================================================================

/// Row filter. Empty selections keep every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripFilter {
    pub carriers: Vec<String>,
    pub weather: Vec<String>,
    pub priorities: Vec<String>,
    /// Inclusive on both ends.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl TripFilter {
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
            && self.weather.is_empty()
            && self.priorities.is_empty()
            && self.date_range.is_none()
    }

    pub fn apply(&self, trips: &Table) -> Table {
        let mut keep = vec![true; trips.num_rows()];

        for (column, selected) in [
            (CARRIER, &self.carriers),
            (WEATHER_LABEL, &self.weather),
            (PRIORITY, &self.priorities),
        ] {
            if selected.is_empty() {
                continue;
            }
            let Some(values) = trips.column(column) else { continue };
            let allowed: HashSet<&str> = selected.iter().map(String::as_str).collect();
            for (k, value) in keep.iter_mut().zip(values) {
                *k &= value.key().is_some_and(|v| allowed.contains(v.as_str()));
            }
        }

        if let (Some((start, end)), Some(dates)) = (self.date_range, parse_order_dates(trips)) {
            for (k, date) in keep.iter_mut().zip(dates) {
                *k &= date.is_some_and(|d| d >= start && d <= end);
            }
        }

        trips.filter(&keep)
    }
}

/// Distinct non-null values of `column`, sorted. Empty when the column is absent.
pub fn distinct_values(trips: &Table, column: &str) -> Vec<String> {
    let mut values: Vec<String> = trips
        .column(column)
        .map(|c| c.iter().filter_map(Value::key).collect::<HashSet<_>>().into_iter().collect())
        .unwrap_or_default();
    values.sort();
    values
}

/// Choices offered by the dashboard filters, drawn from the unfiltered trips.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterOptions {
    pub carriers: Vec<String>,
    pub weather: Vec<String>,
    pub priorities: Vec<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

pub fn filter_options(trips: &Table) -> FilterOptions {
    let dates: Vec<NaiveDate> = parse_order_dates(trips)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect();
    let date_range = match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => Some((*min, *max)),
        _ => None,
    };
    FilterOptions {
        carriers: distinct_values(trips, CARRIER),
        weather: distinct_values(trips, WEATHER_LABEL),
        priorities: distinct_values(trips, PRIORITY),
        date_range,
    }
}

// ============================================================================
// Aggregations
// ============================================================================

fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn numeric_or_empty(trips: &Table, column: &str) -> Result<Vec<Option<f64>>, DataError> {
    Ok(trips
        .numeric(column)?
        .unwrap_or_else(|| vec![None; trips.num_rows()]))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub orders: usize,
    pub avg_delay_min: Option<f64>,
    pub avg_reliability: Option<f64>,
    pub total_cost_inr: f64,
    pub avg_fuel_per_km: Option<f64>,
}

pub fn overview(trips: &Table) -> Result<Overview, DataError> {
    let total_cost = numeric_or_empty(trips, TOTAL_COST)?.iter().flatten().sum();
    Ok(Overview {
        orders: trips.num_rows(),
        avg_delay_min: mean_present(&numeric_or_empty(trips, DELAY_MINUTES)?),
        avg_reliability: mean_present(&numeric_or_empty(trips, RELIABILITY_SCORE)?),
        total_cost_inr: total_cost,
        avg_fuel_per_km: mean_present(&numeric_or_empty(trips, FUEL_PER_KM)?),
    })
}

/// The `limit` most delayed orders, restricted to the summary columns that exist.
pub fn top_delayed(trips: &Table, limit: usize) -> Result<Table, DataError> {
    let delays = numeric_or_empty(trips, DELAY_MINUTES)?;
    let mut order: Vec<usize> = (0..trips.num_rows()).collect();
    // missing delays sort last
    order.sort_by(|&a, &b| match (delays[a], delays[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    order.truncate(limit);

    let columns: Vec<&str> = TOP_DELAYED_COLUMNS
        .iter()
        .copied()
        .filter(|c| trips.has_column(c))
        .collect();
    Ok(trips.take_rows(&order).select(&columns))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CostShare {
    pub component: String,
    pub total_inr: f64,
}

/// Sum of every cost component column that exists.
pub fn cost_breakdown(trips: &Table) -> Result<Vec<CostShare>, DataError> {
    let mut shares = Vec::new();
    for component in COST_COLUMNS {
        if let Some(values) = trips.numeric(component)? {
            shares.push(CostShare {
                component: component.to_string(),
                total_inr: values.iter().flatten().sum(),
            });
        }
    }
    Ok(shares)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of delay minutes. Empty when there are no delays.
/// `bins` is capped at [`MAX_HISTOGRAM_BINS`].
pub fn delay_histogram(trips: &Table, bins: usize) -> Result<Vec<HistogramBin>, DataError> {
    let bins = bins.min(MAX_HISTOGRAM_BINS);
    let values: Vec<f64> = numeric_or_empty(trips, DELAY_MINUTES)?.into_iter().flatten().collect();
    if values.is_empty() || bins == 0 {
        return Ok(Vec::new());
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupDelay {
    pub group: String,
    pub avg_delay_min: f64,
    pub orders: usize,
}

/// Average delay per carrier, worst first. Empty without a carrier column.
pub fn avg_delay_by_carrier(trips: &Table) -> Result<Vec<GroupDelay>, DataError> {
    let Some(carriers) = trips.column(CARRIER) else {
        return Ok(Vec::new());
    };
    let delays = numeric_or_empty(trips, DELAY_MINUTES)?;

    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
    for (carrier, delay) in carriers.iter().zip(&delays) {
        if let (Some(carrier), Some(delay)) = (carrier.key(), delay) {
            let entry = groups.entry(carrier).or_insert((0.0, 0));
            entry.0 += delay;
            entry.1 += 1;
        }
    }

    let mut result: Vec<GroupDelay> = groups
        .into_iter()
        .map(|(group, (sum, n))| GroupDelay {
            group,
            avg_delay_min: sum / n as f64,
            orders: n,
        })
        .collect();
    result.sort_by(|a, b| {
        b.avg_delay_min
            .total_cmp(&a.avg_delay_min)
            .then_with(|| a.group.cmp(&b.group))
    });
    Ok(result)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatePoint {
    pub date: NaiveDate,
    pub avg_delay_min: f64,
}

/// Average delay per order date, oldest first. Empty when dates are unavailable.
pub fn delay_timeline(trips: &Table) -> Result<Vec<DatePoint>, DataError> {
    let Some(dates) = parse_order_dates(trips) else {
        return Ok(Vec::new());
    };
    let delays = numeric_or_empty(trips, DELAY_MINUTES)?;

    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, delay) in dates.into_iter().zip(delays) {
        if let (Some(date), Some(delay)) = (date, delay) {
            let entry = by_date.entry(date).or_insert((0.0, 0));
            entry.0 += delay;
            entry.1 += 1;
        }
    }
    Ok(by_date
        .into_iter()
        .map(|(date, (sum, n))| DatePoint {
            date,
            avg_delay_min: sum / n as f64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trips() -> Table {
        let csv = "Order_ID,Carrier,Priority,Weather_Impact,Order_Date,Route,Distance_KM,Traffic_Delay_Minutes,Total_Cost_INR,Fuel_Cost_INR,Toll_Charges_INR,Reliability_Score,Fuel_per_KM\n\
                   A,SpeedyLogistics,Express,None,2024-01-01,R1,100,10,500,300,50,0.9,0.2\n\
                   B,QuickShip,Standard,Fog,2024-01-01,R2,200,50,900,600,,0.1,0.3\n\
                   C,SpeedyLogistics,Economy,Light_Rain,2024-01-03,R1,150,30,700,400,20,0.5,\n\
                   D,,Express,Heavy_Rain,2024-01-05,R3,80,0,300,100,0,1.0,0.1\n";
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn ids(t: &Table) -> Vec<String> {
        t.column("Order_ID").unwrap().iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = TripFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&trips()), trips());
    }

    #[test]
    fn test_filters_combine() {
        let filter = TripFilter {
            carriers: vec!["SpeedyLogistics".into()],
            priorities: vec!["Express".into(), "Economy".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&trips())), vec!["A", "C"]);

        let filter = TripFilter {
            weather: vec!["Fog".into(), "Heavy_Rain".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&trips())), vec!["B", "D"]);
    }

    #[test]
    fn test_filter_on_absent_column_is_ignored() {
        let t = Table::from_reader("Order_ID,Traffic_Delay_Minutes\nA,1\nB,2\n".as_bytes()).unwrap();
        let filter = TripFilter {
            carriers: vec!["Nobody".into()],
            ..Default::default()
        };
        assert_eq!(filter.apply(&t).num_rows(), 2);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let filter = TripFilter {
            date_range: Some((d(1), d(3))),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&trips())), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_distinct_values() {
        assert_eq!(
            distinct_values(&trips(), CARRIER),
            vec!["QuickShip".to_string(), "SpeedyLogistics".to_string()]
        );
        assert!(distinct_values(&trips(), "Product_Category").is_empty());
    }

    #[test]
    fn test_filter_options() {
        let options = filter_options(&trips());
        assert_eq!(options.carriers, distinct_values(&trips(), CARRIER));
        assert_eq!(options.priorities, vec!["Economy", "Express", "Standard"]);
        assert_eq!(options.weather.len(), 4);
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(options.date_range, Some((d(1), d(5))));
    }

    #[test]
    fn test_overview() {
        let o = overview(&trips()).unwrap();
        assert_eq!(o.orders, 4);
        assert_eq!(o.avg_delay_min, Some(22.5));
        assert_eq!(o.avg_reliability, Some(0.625));
        assert_eq!(o.total_cost_inr, 2400.0);
        // C has no fuel per km
        assert!((o.avg_fuel_per_km.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_overview_of_empty_table() {
        let o = overview(&TripFilter { carriers: vec!["None".into()], ..Default::default() }.apply(&trips())).unwrap();
        assert_eq!(o.orders, 0);
        assert_eq!(o.avg_delay_min, None);
        assert_eq!(o.total_cost_inr, 0.0);
    }

    #[test]
    fn test_top_delayed() {
        let top = top_delayed(&trips(), 2).unwrap();
        assert_eq!(ids(&top), vec!["B", "C"]);
        assert_eq!(
            top.column_names(),
            &["Order_ID", "Route", "Distance_KM", "Traffic_Delay_Minutes", "Total_Cost_INR"]
        );
    }

    #[test]
    fn test_cost_breakdown_only_present_columns() {
        let shares = cost_breakdown(&trips()).unwrap();
        assert_eq!(
            shares,
            vec![
                CostShare { component: "Fuel_Cost_INR".into(), total_inr: 1400.0 },
                CostShare { component: "Toll_Charges_INR".into(), total_inr: 70.0 },
            ]
        );
    }

    #[test]
    fn test_histogram() {
        let bins = delay_histogram(&trips(), HISTOGRAM_BINS).unwrap();
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[HISTOGRAM_BINS - 1].count, 1);
    }

    #[test]
    fn test_histogram_bin_count_is_capped() {
        let bins = delay_histogram(&trips(), usize::MAX).unwrap();
        assert_eq!(bins.len(), MAX_HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_histogram_single_value() {
        let t = Table::from_reader("Traffic_Delay_Minutes\n5\n5\n".as_bytes()).unwrap();
        let bins = delay_histogram(&t, HISTOGRAM_BINS).unwrap();
        assert_eq!(bins, vec![HistogramBin { lower: 5.0, upper: 5.0, count: 2 }]);
    }

    #[test]
    fn test_avg_delay_by_carrier() {
        let groups = avg_delay_by_carrier(&trips()).unwrap();
        assert_eq!(
            groups,
            vec![
                GroupDelay { group: "QuickShip".into(), avg_delay_min: 50.0, orders: 1 },
                GroupDelay { group: "SpeedyLogistics".into(), avg_delay_min: 20.0, orders: 2 },
            ]
        );
    }

    #[test]
    fn test_delay_timeline() {
        let points = delay_timeline(&trips()).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(
            points,
            vec![
                DatePoint { date: d(1), avg_delay_min: 30.0 },
                DatePoint { date: d(3), avg_delay_min: 30.0 },
                DatePoint { date: d(5), avg_delay_min: 0.0 },
            ]
        );
    }
}
