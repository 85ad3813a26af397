//! Shared business logic for the dashboard API
//!
//! Holds the application state built at startup and hands out cheap snapshots.
//! Anything that may block (data loading, the crew call) runs on the blocking pool.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::app::{AppState, Forecast, Summary};
use crate::config::AppConfig;
use crate::dashboard::{self, CostShare, DatePoint, FilterOptions, GroupDelay, HistogramBin, TripFilter};
use crate::export;
use crate::impact::TripInput;
use crate::table::Table;

pub struct DashboardService {
    config: AppConfig,
    state: RwLock<Arc<AppState>>,
}

impl DashboardService {
    /// Build the state once from `config`.
    pub async fn start(config: AppConfig) -> Result<Self> {
        let state = build_state(config.clone()).await?;
        Ok(Self::from_state(config, state))
    }

    pub fn from_state(config: AppConfig, state: AppState) -> Self {
        Self {
            config,
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// The current state. Requests keep using the snapshot they started with.
    pub async fn snapshot(&self) -> Arc<AppState> {
        self.state.read().await.clone()
    }

    /// Reload data and model from disk and swap the new state in.
    /// On failure the previous state stays active.
    pub async fn refresh(&self) -> Result<Arc<AppState>> {
        let fresh = Arc::new(build_state(self.config.clone()).await?);
        {
            let mut state = self.state.write().await;
            *state = fresh.clone();
        }
        info!(orders = fresh.trips.num_rows(), "Dashboard state refreshed");
        Ok(fresh)
    }

    pub async fn summary(&self, filter: &TripFilter) -> Result<Summary> {
        Ok(self.snapshot().await.summary(filter)?)
    }

    pub async fn trips(&self, filter: &TripFilter) -> Table {
        self.snapshot().await.filtered(filter)
    }

    pub async fn trips_csv(&self, filter: &TripFilter) -> Result<String> {
        Ok(export::trips_to_csv(&self.trips(filter).await)?)
    }

    pub async fn top_delayed(&self, filter: &TripFilter, limit: usize) -> Result<Table> {
        Ok(dashboard::top_delayed(&self.trips(filter).await, limit)?)
    }

    pub async fn cost_breakdown(&self, filter: &TripFilter) -> Result<Vec<CostShare>> {
        Ok(dashboard::cost_breakdown(&self.trips(filter).await)?)
    }

    pub async fn filter_options(&self) -> FilterOptions {
        dashboard::filter_options(&self.snapshot().await.trips)
    }

    pub async fn carriers(&self, filter: &TripFilter) -> Result<Vec<GroupDelay>> {
        Ok(dashboard::avg_delay_by_carrier(&self.trips(filter).await)?)
    }

    pub async fn timeline(&self, filter: &TripFilter) -> Result<Vec<DatePoint>> {
        Ok(dashboard::delay_timeline(&self.trips(filter).await)?)
    }

    pub async fn histogram(&self, filter: &TripFilter, bins: usize) -> Result<Vec<HistogramBin>> {
        Ok(dashboard::delay_histogram(&self.trips(filter).await, bins)?)
    }

    /// Prediction and ranked actions for one trip.
    pub async fn forecast(&self, input: TripInput) -> Result<Forecast> {
        let state = self.snapshot().await;
        let forecast = tokio::task::spawn_blocking(move || state.forecast(&input)).await??;
        Ok(forecast)
    }

    pub async fn actions_csv(&self, input: TripInput) -> Result<String> {
        let forecast = self.forecast(input).await?;
        Ok(export::actions_to_csv(&forecast.actions)?)
    }
}

async fn build_state(config: AppConfig) -> Result<AppState> {
    let state = tokio::task::spawn_blocking(move || AppState::initialize(config)).await??;
    Ok(state)
}
