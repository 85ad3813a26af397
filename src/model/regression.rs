//! Ordinary least squares with an intercept.
//!
//! Features and target are centred, the centred system is solved through an SVD
//! (minimum-norm solution when columns are collinear) and the intercept is
//! recovered from the means.

use crate::error::ModelError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Iteration cap for the SVD; non-convergence is a fit error.
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Fitted linear regressor. Serialized as part of the model artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegression {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    pub fn fit(feature_names: Vec<String>, x: &[Vec<f64>], y: &[f64]) -> Result<Self, ModelError> {
        let n = x.len();
        let p = feature_names.len();
        if n == 0 {
            return Err(ModelError::Fit("no training rows".into()));
        }
        if y.len() != n {
            return Err(ModelError::Fit(format!("{} rows but {} targets", n, y.len())));
        }
        if let Some(row) = x.iter().find(|row| row.len() != p) {
            return Err(ModelError::FeatureWidth {
                expected: p,
                found: row.len(),
            });
        }
        if let Some(i) = x.iter().position(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(ModelError::Fit(format!("non-finite feature value in row {}", i)));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::Fit(format!("non-finite target value in row {}", i)));
        }

        let x_means: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;

        let centred_x = DMatrix::from_fn(n, p, |i, j| x[i][j] - x_means[j]);
        let centred_y = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));
        if centred_x.iter().chain(centred_y.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::Fit("training values overflow when centred".into()));
        }

        let svd = centred_x
            .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| ModelError::Fit("SVD did not converge".into()))?;
        let eps = (svd.singular_values.max() * 1e-10).max(1e-12);
        let beta = svd
            .solve(&centred_y, eps)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        let model = Self {
            feature_names,
            coefficients,
            intercept,
        };
        if !model.is_valid() {
            return Err(ModelError::Fit("non-finite coefficients".into()));
        }
        Ok(model)
    }

    /// Coefficient count matches the feature list and every parameter is finite.
    pub fn is_valid(&self) -> bool {
        self.coefficients.len() == self.feature_names.len()
            && self.intercept.is_finite()
            && self.coefficients.iter().all(|c| c.is_finite())
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        x.iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(ModelError::FeatureWidth {
                        expected: self.coefficients.len(),
                        found: row.len(),
                    });
                }
                Ok(self.predict_row(row))
            })
            .collect()
    }
}

/// Coefficient of determination. A constant target scores 1.0 only on a perfect fit.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
