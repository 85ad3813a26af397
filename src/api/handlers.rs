//! REST API handlers for the delivery delay dashboard
//!
//! These handlers use the shared DashboardService.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

use super::service::DashboardService;
use crate::app::{Forecast, Summary};
use crate::dashboard::{
    CostShare, DatePoint, FilterOptions, GroupDelay, HistogramBin, TripFilter, HISTOGRAM_BINS,
    MAX_HISTOGRAM_BINS, TOP_DELAYED_LIMIT,
};
use crate::impact::TripInput;
use crate::model::ModelOrigin;
use crate::table::Table;

// ============================================================================
// Response Types
// ============================================================================

type JsonRow = serde_json::Map<String, serde_json::Value>;

#[derive(Serialize)]
pub struct TripsResponse {
    pub total: usize,
    pub returned: usize,
    pub trips: Vec<JsonRow>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub orders: usize,
    pub model: ModelOrigin,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal(e: impl Display) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() }))
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn csv_attachment(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
}

fn json_rows(table: &Table, limit: Option<usize>) -> Vec<JsonRow> {
    let all = table.to_json_rows();
    match limit {
        Some(n) => all.into_iter().take(n).collect(),
        None => all,
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Dashboard filters. List values are comma-separated; dates are `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub carrier: Option<String>,
    pub weather: Option<String>,
    pub priority: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub bins: Option<usize>,
}

fn split_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl FilterQuery {
    pub fn to_filter(&self) -> Result<TripFilter, String> {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => {
                let start = from.unwrap_or(NaiveDate::MIN);
                let end = to.unwrap_or(NaiveDate::MAX);
                if start > end {
                    return Err(format!("Invalid date range: {} is after {}", start, end));
                }
                Some((start, end))
            }
        };
        Ok(TripFilter {
            carriers: split_list(&self.carrier),
            weather: split_list(&self.weather),
            priorities: split_list(&self.priority),
            date_range,
        })
    }
}

/// Largest `limit` a listing endpoint accepts.
pub const MAX_ROW_LIMIT: usize = 10_000;

fn filter_from(query: &FilterQuery) -> Result<TripFilter, ApiError> {
    query.to_filter().map_err(bad_request)
}

fn bounded(name: &str, value: Option<usize>, default: usize, max: usize) -> Result<usize, ApiError> {
    match value {
        None => Ok(default),
        Some(v) if (1..=max).contains(&v) => Ok(v),
        Some(v) => Err(bad_request(format!("{} must be between 1 and {}, got {}", name, max, v))),
    }
}

fn validate(input: &TripInput) -> Result<(), ApiError> {
    let fields = [
        ("distance_km", input.distance_km),
        ("fuel_consumption_l", input.fuel_consumption_l),
        ("toll_charges_inr", input.toll_charges_inr),
        ("total_cost_inr", input.total_cost_inr),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(bad_request(format!("{} must be a non-negative number", name)));
        }
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

pub type ServiceState = Arc<DashboardService>;

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/filters
pub async fn get_filter_options(State(service): State<ServiceState>) -> Json<FilterOptions> {
    Json(service.filter_options().await)
}

/// GET /api/v1/overview
pub async fn get_overview(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Summary>, ApiError> {
    let filter = filter_from(&params)?;
    service.summary(&filter).await.map(Json).map_err(internal)
}

/// GET /api/v1/trips
pub async fn get_trips(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<TripsResponse>, ApiError> {
    let filter = filter_from(&params)?;
    let limit = match params.limit {
        Some(n) => Some(bounded("limit", Some(n), n, MAX_ROW_LIMIT)?),
        None => None,
    };
    let trips = service.trips(&filter).await;
    let rows = json_rows(&trips, limit);
    Ok(Json(TripsResponse {
        total: trips.num_rows(),
        returned: rows.len(),
        trips: rows,
    }))
}

/// GET /api/v1/trips/export
pub async fn export_trips(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = filter_from(&params)?;
    let body = service.trips_csv(&filter).await.map_err(internal)?;
    Ok(csv_attachment("filtered_delivery_data.csv", body))
}

/// GET /api/v1/analytics/top-delayed
pub async fn get_top_delayed(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<JsonRow>>, ApiError> {
    let filter = filter_from(&params)?;
    let limit = bounded("limit", params.limit, TOP_DELAYED_LIMIT, MAX_ROW_LIMIT)?;
    let top = service.top_delayed(&filter, limit).await.map_err(internal)?;
    Ok(Json(json_rows(&top, None)))
}

/// GET /api/v1/analytics/cost-breakdown
pub async fn get_cost_breakdown(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<CostShare>>, ApiError> {
    let filter = filter_from(&params)?;
    service.cost_breakdown(&filter).await.map(Json).map_err(internal)
}

/// GET /api/v1/analytics/carriers
pub async fn get_carriers(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<GroupDelay>>, ApiError> {
    let filter = filter_from(&params)?;
    service.carriers(&filter).await.map(Json).map_err(internal)
}

/// GET /api/v1/analytics/timeline
pub async fn get_timeline(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<DatePoint>>, ApiError> {
    let filter = filter_from(&params)?;
    service.timeline(&filter).await.map(Json).map_err(internal)
}

/// GET /api/v1/analytics/histogram?bins=N
pub async fn get_histogram(
    State(service): State<ServiceState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<HistogramBin>>, ApiError> {
    let filter = filter_from(&params)?;
    let bins = bounded("bins", params.bins, HISTOGRAM_BINS, MAX_HISTOGRAM_BINS)?;
    service.histogram(&filter, bins).await.map(Json).map_err(internal)
}

/// POST /api/v1/predict
pub async fn predict(
    State(service): State<ServiceState>,
    Json(input): Json<TripInput>,
) -> Result<Json<Forecast>, ApiError> {
    validate(&input)?;
    service.forecast(input).await.map(Json).map_err(internal)
}

/// POST /api/v1/actions/export
pub async fn export_actions(
    State(service): State<ServiceState>,
    Json(input): Json<TripInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&input)?;
    let body = service.actions_csv(input).await.map_err(internal)?;
    Ok(csv_attachment("corrective_actions.csv", body))
}

/// POST /api/v1/refresh
pub async fn refresh(State(service): State<ServiceState>) -> Result<Json<RefreshResponse>, ApiError> {
    let state = service.refresh().await.map_err(internal)?;
    Ok(Json(RefreshResponse {
        orders: state.trips.num_rows(),
        model: state.model.origin.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_parsing() {
        let query = FilterQuery {
            carrier: Some("A, B,,".into()),
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.carriers, vec!["A".to_string(), "B".to_string()]);
        assert!(filter.weather.is_empty());
        assert_eq!(
            filter.date_range,
            Some((NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::MAX))
        );
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let query = FilterQuery {
            from: NaiveDate::from_ymd_opt(2024, 2, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_bounded_query_values() {
        assert_eq!(bounded("bins", None, HISTOGRAM_BINS, MAX_HISTOGRAM_BINS).unwrap(), HISTOGRAM_BINS);
        assert_eq!(bounded("bins", Some(5), HISTOGRAM_BINS, MAX_HISTOGRAM_BINS).unwrap(), 5);
        assert!(bounded("bins", Some(0), HISTOGRAM_BINS, MAX_HISTOGRAM_BINS).is_err());
        assert!(bounded("bins", Some(usize::MAX), HISTOGRAM_BINS, MAX_HISTOGRAM_BINS).is_err());
        assert!(bounded("limit", Some(MAX_ROW_LIMIT + 1), TOP_DELAYED_LIMIT, MAX_ROW_LIMIT).is_err());
    }

    #[test]
    fn test_negative_input_rejected() {
        let input = TripInput {
            distance_km: -1.0,
            fuel_consumption_l: 10.0,
            toll_charges_inr: 0.0,
            weather: "None".into(),
            total_cost_inr: 100.0,
        };
        assert!(validate(&input).is_err());
    }
}
