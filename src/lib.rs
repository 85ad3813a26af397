//! Delivery delay analytics: dataset merging, KPI metrics, delay prediction and
//! ranked corrective actions, served over a small REST API.

pub mod api;
pub mod app;
pub mod config;
pub mod crew;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod impact;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod table;
