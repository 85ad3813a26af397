//! Process-wide application state: merged data, metrics, model and crew, built once.

use crate::config::AppConfig;
use crate::crew::{build_crew, Crew};
use crate::dashboard::{self, Overview, TripFilter};
use crate::error::{DataError, ModelError};
use crate::impact::{generate_corrective_actions, predict_delay, CorrectiveAction, TripInput};
use crate::loader::{load_and_merge, DataSources};
use crate::metrics::{compute_metrics, MetricsOutcome};
use crate::model::{load_or_train, LoadedModel, ModelOrigin};
use crate::table::Table;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

pub struct AppState {
    pub config: AppConfig,
    /// Merged trips with derived metric columns.
    pub trips: Table,
    pub fleet: Table,
    pub advisories: Vec<String>,
    pub model: LoadedModel,
    pub crew: Box<dyn Crew>,
}

/// Headline numbers plus where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub overview: Overview,
    pub vehicles: usize,
    pub model: ModelOrigin,
    pub crew: &'static str,
    pub advisories: Vec<String>,
}

/// Prediction for one trip and the ranked actions that would reduce it.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub predicted_delay_min: f64,
    pub actions: Vec<CorrectiveAction>,
}

impl AppState {
    /// Merge the inputs, compute metrics, then load or train the model and pick a crew.
    ///
    /// Only missing or unreadable data is an error. Model and crew problems degrade
    /// to the fallback model and the offline crew.
    pub fn initialize(config: AppConfig) -> Result<Self, DataError> {
        let started = Instant::now();
        let merged = load_and_merge(&DataSources::in_dir(&config.data_dir))?;
        let MetricsOutcome { table: trips, advisories } = compute_metrics(merged.trips)?;

        let training = trips.clone();
        let model = load_or_train(&config.model_path, move || Ok(training));
        let crew = build_crew(&config.crew);

        info!(
            orders = trips.num_rows(),
            advisories = advisories.len(),
            model = ?model.origin,
            crew = crew.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Application state ready"
        );

        Ok(Self {
            config,
            trips,
            fleet: merged.fleet,
            advisories,
            model,
            crew,
        })
    }

    pub fn filtered(&self, filter: &TripFilter) -> Table {
        if filter.is_empty() {
            self.trips.clone()
        } else {
            filter.apply(&self.trips)
        }
    }

    pub fn summary(&self, filter: &TripFilter) -> Result<Summary, DataError> {
        Ok(Summary {
            overview: dashboard::overview(&self.filtered(filter))?,
            vehicles: self.fleet.num_rows(),
            model: self.model.origin.clone(),
            crew: self.crew.name(),
            advisories: self.advisories.clone(),
        })
    }

    pub fn predict(&self, input: &TripInput) -> Result<f64, ModelError> {
        predict_delay(&self.model.model, &input.to_frame())
    }

    /// Predicted delay plus crew-enriched corrective actions. Blocks while the crew answers.
    pub fn forecast(&self, input: &TripInput) -> Result<Forecast, ModelError> {
        let base = input.to_frame();
        let predicted_delay_min = predict_delay(&self.model.model, &base)?;
        let actions = generate_corrective_actions(
            &self.trips,
            &self.model.model,
            &base,
            Some(self.crew.as_ref()),
        )?;
        Ok(Forecast {
            predicted_delay_min,
            actions,
        })
    }
}
