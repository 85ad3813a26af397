//! Error types for the delivery-delay library.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading, joining or coercing tabular data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Required data file not found: {}", path.display())]
    MissingDataFile { path: PathBuf },

    #[error("{source_name} has no '{column}' column")]
    MissingKeyColumn { source_name: String, column: String },

    #[error("{source_name} contains duplicate key '{key}'")]
    DuplicateKey { source_name: String, key: String },

    #[error("column '{column}' row {row}: cannot read '{value}' as a number")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside the delay model or its artifact handling.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("expected {expected} features per row, found {found}")]
    FeatureWidth { expected: usize, found: usize },

    #[error("model fit failed: {0}")]
    Fit(String),

    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the remote advisory crew.
#[derive(Error, Debug)]
pub enum CrewError {
    #[error("crew request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("crew returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("crew returned an empty response")]
    EmptyResponse,
}
