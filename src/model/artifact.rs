//! On-disk model artifact.
//!
//! The artifact is JSON holding either a wrapped model (feature list plus
//! regressor) or a bare regressor. Whatever is read back is validated before it
//! is trusted.

use super::wrapper::{PredictWrapper, Regressor};
use super::default_features;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    Wrapped(PredictWrapper),
    Bare(Regressor),
}

impl ModelArtifact {
    /// Turn the artifact into a usable wrapper, rejecting inconsistent models.
    pub fn into_wrapper(self) -> Result<PredictWrapper, ModelError> {
        let wrapper = match self {
            ModelArtifact::Wrapped(wrapper) => wrapper,
            ModelArtifact::Bare(Regressor::Linear(model)) => {
                PredictWrapper::new(model.feature_names.clone(), Regressor::Linear(model))
            }
            ModelArtifact::Bare(Regressor::Zero) => PredictWrapper::new(default_features(), Regressor::Zero),
        };
        if !wrapper.is_valid() {
            return Err(ModelError::Artifact(format!(
                "{} features do not match the stored coefficients",
                wrapper.features.len()
            )));
        }
        Ok(wrapper)
    }
}

/// Read and validate the artifact at `path`. `Ok(None)` when no file exists.
pub fn load_artifact(path: &Path) -> Result<Option<PredictWrapper>, ModelError> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    let artifact: ModelArtifact = serde_json::from_reader(reader)?;
    artifact.into_wrapper().map(Some)
}

/// Persist a wrapped model, replacing any previous artifact wholesale.
pub fn save_artifact(path: &Path, wrapper: &PredictWrapper) -> Result<(), ModelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &ModelArtifact::Wrapped(wrapper.clone()))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearRegression;
    use tempfile::TempDir;

    fn trained() -> PredictWrapper {
        let features = default_features();
        PredictWrapper::new(
            features.clone(),
            Regressor::Linear(LinearRegression {
                feature_names: features,
                coefficients: vec![0.1, 2.0, 3.0, 0.001],
                intercept: 4.0,
            }),
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models/model.json");
        save_artifact(&path, &trained()).unwrap();
        assert_eq!(load_artifact(&path).unwrap(), Some(trained()));
    }

    #[test]
    fn test_missing_artifact_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_artifact(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn test_bare_regressor_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.json");
        let bare = ModelArtifact::Bare(Regressor::Linear(LinearRegression {
            feature_names: vec!["Distance_KM".into()],
            coefficients: vec![0.5],
            intercept: 1.0,
        }));
        fs::write(&path, serde_json::to_string(&bare).unwrap()).unwrap();

        let wrapper = load_artifact(&path).unwrap().unwrap();
        assert_eq!(wrapper.features, vec!["Distance_KM".to_string()]);
    }

    #[test]
    fn test_inconsistent_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let mut wrapper = trained();
        wrapper.features.truncate(2);
        fs::write(&path, serde_json::to_string(&ModelArtifact::Wrapped(wrapper)).unwrap()).unwrap();
        assert!(matches!(load_artifact(&path), Err(ModelError::Artifact(_))));
    }

    #[test]
    fn test_garbage_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.json");
        fs::write(&path, b"\x00\x01not json").unwrap();
        assert!(matches!(load_artifact(&path), Err(ModelError::Json(_))));
    }
}
