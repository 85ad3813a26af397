//! Adapter that turns a raw feature table into the dense matrix a regressor needs.

use super::regression::LinearRegression;
use super::weather::{weather_code, WEATHER_CODE, WEATHER_LABEL};
use super::{default_features, DelayModel, ModelInput};
use crate::error::ModelError;
use crate::metrics::{DISTANCE_KM, FUEL_LITRES, FUEL_PER_KM};
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};

/// The regressor held inside a wrapper or stored bare in an artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearRegression),
    Zero,
}

impl Regressor {
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        match self {
            Regressor::Linear(model) => model.predict(x),
            Regressor::Zero => Ok(vec![0.0; x.len()]),
        }
    }
}

/// Feature list plus regressor; accepts tables that lack engineered columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictWrapper {
    pub features: Vec<String>,
    pub regressor: Regressor,
}

impl PredictWrapper {
    pub fn new(features: Vec<String>, regressor: Regressor) -> Self {
        Self {
            features,
            regressor,
        }
    }

    /// Zero-predicting wrapper over the default feature set.
    pub fn fallback() -> Self {
        Self::new(default_features(), Regressor::Zero)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.regressor, Regressor::Zero)
    }

    /// A wrapped linear model must have one coefficient per declared feature.
    pub fn is_valid(&self) -> bool {
        match &self.regressor {
            Regressor::Linear(model) => {
                model.is_valid() && model.coefficients.len() == self.features.len()
            }
            Regressor::Zero => true,
        }
    }

    /// Derive engineered columns and return a fully dense matrix in feature order.
    ///
    /// Zero distance is replaced by 1 when deriving fuel per km, so the result is
    /// always finite. Remaining gaps become 0.
    pub fn preprocess(&self, frame: &Table) -> Result<Vec<Vec<f64>>, ModelError> {
        let mut x = frame.clone();
        let rows = x.num_rows();

        if !x.has_column(FUEL_PER_KM) {
            if let (Some(fuel), Some(distance)) = (x.numeric(FUEL_LITRES)?, x.numeric(DISTANCE_KM)?) {
                let derived: Vec<Option<f64>> = fuel
                    .iter()
                    .zip(&distance)
                    .map(|(f, d)| match (f, d) {
                        (Some(f), Some(d)) => Some(f / if *d == 0.0 { 1.0 } else { *d }),
                        _ => None,
                    })
                    .collect();
                x.set_numeric(FUEL_PER_KM, derived);
            }
        }

        if let Some(labels) = x.column(WEATHER_LABEL) {
            let codes: Vec<Value> = labels
                .iter()
                .map(|label| match label {
                    Value::Text(s) => Value::Number(weather_code(s)),
                    _ => Value::Number(0.0),
                })
                .collect();
            x.set_column(WEATHER_CODE, codes);
        } else if !x.has_column(WEATHER_CODE) {
            x.set_numeric(WEATHER_CODE, vec![Some(0.0); rows]);
        }

        let mut columns = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let values = x.numeric(feature)?.unwrap_or_else(|| vec![None; rows]);
            columns.push(values);
        }

        Ok((0..rows)
            .map(|row| columns.iter().map(|c| c[row].unwrap_or(0.0)).collect())
            .collect())
    }
}

impl DelayModel for PredictWrapper {
    fn predict(&self, input: ModelInput<'_>) -> Result<Vec<f64>, ModelError> {
        if self.is_fallback() {
            return Ok(vec![0.0; input.rows()]);
        }
        match input {
            ModelInput::Frame(frame) => {
                let matrix = self.preprocess(frame)?;
                self.regressor.predict(&matrix)
            }
            ModelInput::Matrix(matrix) => self.regressor.predict(matrix),
        }
    }
}
