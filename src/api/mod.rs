//! REST interface to the delivery delay dashboard.

pub mod handlers;
pub mod service;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use service::DashboardService;

pub fn create_router(service: Arc<DashboardService>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/filters", get(handlers::get_filter_options))
        .route("/api/v1/overview", get(handlers::get_overview))
        // Trips
        .route("/api/v1/trips", get(handlers::get_trips))
        .route("/api/v1/trips/export", get(handlers::export_trips))
        // Analytics
        .route("/api/v1/analytics/top-delayed", get(handlers::get_top_delayed))
        .route("/api/v1/analytics/cost-breakdown", get(handlers::get_cost_breakdown))
        .route("/api/v1/analytics/carriers", get(handlers::get_carriers))
        .route("/api/v1/analytics/timeline", get(handlers::get_timeline))
        .route("/api/v1/analytics/histogram", get(handlers::get_histogram))
        // Prediction
        .route("/api/v1/predict", post(handlers::predict))
        .route("/api/v1/actions/export", post(handlers::export_actions))
        .route("/api/v1/refresh", post(handlers::refresh))
        // State and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
