//! Delay prediction: the predict capability, the wrapper that implements it and
//! the artifact/training lifecycle around them.

pub mod artifact;
pub mod regression;
pub mod training;
pub mod weather;
pub mod wrapper;

use crate::error::ModelError;
use crate::table::Table;

pub use regression::LinearRegression;
pub use training::{load_or_train, LoadedModel, ModelOrigin};
pub use wrapper::{PredictWrapper, Regressor};

/// Feature set the delay model is trained on, in column order.
pub const DEFAULT_FEATURES: [&str; 4] = [
    "Distance_KM",
    "Fuel_per_KM",
    "Weather_Impact_Num",
    "Total_Cost_INR",
];

pub fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect()
}

/// Input accepted by a delay model: a raw feature table or an already dense matrix.
#[derive(Debug, Clone, Copy)]
pub enum ModelInput<'a> {
    Frame(&'a Table),
    Matrix(&'a [Vec<f64>]),
}

impl ModelInput<'_> {
    pub fn rows(&self) -> usize {
        match self {
            ModelInput::Frame(table) => table.num_rows(),
            ModelInput::Matrix(rows) => rows.len(),
        }
    }
}

/// Anything that predicts delay minutes, one value per input row.
pub trait DelayModel: Send + Sync {
    fn predict(&self, input: ModelInput<'_>) -> Result<Vec<f64>, ModelError>;
}
