//! Model loading and training.
//!
//! `load_or_train` never fails: a valid artifact is used as-is, otherwise a
//! linear model is fitted on the trip table, and if that is impossible the
//! zero-predicting fallback is returned.

use super::artifact::{load_artifact, save_artifact};
use super::regression::{r2_score, LinearRegression};
use super::weather::{weather_code, WEATHER_CODE, WEATHER_LABEL};
use super::wrapper::{PredictWrapper, Regressor};
use super::{default_features, DEFAULT_FEATURES};
use crate::error::ModelError;
use crate::loader::{load_and_merge, DataSources};
use crate::metrics::{compute_metrics, DELAY_MINUTES};
use crate::table::{Table, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fewer usable rows than this and the fallback model is used.
pub const MIN_TRAINING_ROWS: usize = 2;

/// Where the active model came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelOrigin {
    Artifact { path: PathBuf },
    Trained { rows: usize, r2: f64 },
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: PredictWrapper,
    pub origin: ModelOrigin,
}

impl LoadedModel {
    fn fallback(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(%reason, "Using zero-delay fallback model");
        Self {
            model: PredictWrapper::fallback(),
            origin: ModelOrigin::Fallback { reason },
        }
    }
}

/// Result of fitting on a trip table.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub model: PredictWrapper,
    pub rows: usize,
    pub r2: f64,
}

/// Merge the sources and compute metrics, ready for training.
pub fn training_table(sources: &DataSources) -> Result<Table, ModelError> {
    let merged = load_and_merge(sources)?;
    Ok(compute_metrics(merged.trips)?.table)
}

/// Dense feature matrix and target vector over the default feature set.
pub fn training_matrix(trips: &Table) -> Result<(Vec<Vec<f64>>, Vec<f64>), ModelError> {
    let rows = trips.num_rows();
    let mut frame = trips.clone();

    let codes: Vec<Value> = match frame.column(WEATHER_LABEL) {
        Some(labels) => labels
            .iter()
            .map(|label| match label {
                Value::Text(s) => Value::Number(weather_code(s)),
                _ => Value::Number(0.0),
            })
            .collect(),
        None => vec![Value::Number(0.0); rows],
    };
    frame.set_column(WEATHER_CODE, codes);

    let mut columns = Vec::with_capacity(DEFAULT_FEATURES.len());
    for feature in DEFAULT_FEATURES {
        columns.push(frame.numeric(feature)?.unwrap_or_else(|| vec![None; rows]));
    }
    let x = (0..rows)
        .map(|row| columns.iter().map(|c| c[row].unwrap_or(0.0)).collect())
        .collect();
    let y = frame
        .numeric(DELAY_MINUTES)?
        .unwrap_or_else(|| vec![None; rows])
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok((x, y))
}

/// Fit a linear delay model. `Ok(None)` when there are too few rows.
pub fn fit_delay_model(trips: &Table) -> Result<Option<FitReport>, ModelError> {
    let (x, y) = training_matrix(trips)?;
    if x.len() < MIN_TRAINING_ROWS {
        return Ok(None);
    }
    let regression = LinearRegression::fit(default_features(), &x, &y)?;
    let predicted = regression.predict(&x)?;
    let r2 = r2_score(&y, &predicted);
    Ok(Some(FitReport {
        model: PredictWrapper::new(default_features(), Regressor::Linear(regression)),
        rows: x.len(),
        r2,
    }))
}

/// Hold-out R² on a seeded shuffle. `Ok(None)` when either side of the split would be empty.
pub fn holdout_r2(trips: &Table, test_fraction: f64, seed: u64) -> Result<Option<f64>, ModelError> {
    let (x, y) = training_matrix(trips)?;
    let n = x.len();
    let test_len = ((n as f64) * test_fraction).ceil() as usize;
    if test_len == 0 || n.saturating_sub(test_len) < MIN_TRAINING_ROWS {
        return Ok(None);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(test_len);

    let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            idx.iter().map(|&i| x[i].clone()).collect(),
            idx.iter().map(|&i| y[i]).collect(),
        )
    };
    let (train_x, train_y) = pick(train_idx);
    let (test_x, test_y) = pick(test_idx);

    let regression = LinearRegression::fit(default_features(), &train_x, &train_y)?;
    let predicted = regression.predict(&test_x)?;
    Ok(Some(r2_score(&test_y, &predicted)))
}

/// Fit on `trips` and persist the result. Persistence failures are ignored.
pub fn train_and_persist(trips: &Table, model_path: &Path) -> LoadedModel {
    match fit_delay_model(trips) {
        Ok(Some(report)) => {
            if let Err(e) = save_artifact(model_path, &report.model) {
                debug!(path = %model_path.display(), error = %e, "Could not persist model artifact");
            }
            info!(rows = report.rows, r2 = report.r2, "Trained delay model");
            LoadedModel {
                model: report.model,
                origin: ModelOrigin::Trained {
                    rows: report.rows,
                    r2: report.r2,
                },
            }
        }
        Ok(None) => LoadedModel::fallback(format!(
            "fewer than {} training rows",
            MIN_TRAINING_ROWS
        )),
        Err(e) => LoadedModel::fallback(e.to_string()),
    }
}

/// Use the artifact at `model_path` if it is valid, otherwise train on the table
/// produced by `training_data`, otherwise fall back to the zero model.
pub fn load_or_train<F>(model_path: &Path, training_data: F) -> LoadedModel
where
    F: FnOnce() -> Result<Table, ModelError>,
{
    match load_artifact(model_path) {
        Ok(Some(model)) => {
            info!(path = %model_path.display(), "Loaded model artifact");
            return LoadedModel {
                model,
                origin: ModelOrigin::Artifact {
                    path: model_path.to_path_buf(),
                },
            };
        }
        Ok(None) => debug!(path = %model_path.display(), "No model artifact, training"),
        Err(e) => warn!(path = %model_path.display(), error = %e, "Ignoring unusable model artifact"),
    }

    match training_data() {
        Ok(trips) => train_and_persist(&trips, model_path),
        Err(e) => LoadedModel::fallback(e.to_string()),
    }
}
