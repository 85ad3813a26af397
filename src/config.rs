//! Runtime configuration, resolved once from the environment.
//!
//! Environment variables:
//!   DELAY_DATA_DIR    - directory with the CSV inputs (default: data)
//!   DELAY_MODEL_PATH  - model artifact path (default: model.json)
//!   FORCE_LOCAL_CREW  - 1/true/True forces the offline crew
//!   OPENAI_API_KEY / CREWAI_API_KEY - enables the remote crew when present
//!   CREW_API_URL      - chat-completions base URL (default: https://api.openai.com/v1)
//!   CREW_MODEL        - model name sent to the crew endpoint (default: gpt-4o-mini)
//!   CREW_TIMEOUT_SECS - request timeout for the crew call (default: 20)

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MODEL_PATH: &str = "model.json";
pub const DEFAULT_CREW_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CREW_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CREW_TIMEOUT_SECS: u64 = 20;

/// Which crew implementation to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrewBackend {
    Local,
    Remote {
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewConfig {
    pub backend: CrewBackend,
}

impl CrewConfig {
    pub fn local() -> Self {
        Self {
            backend: CrewBackend::Local,
        }
    }

    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Collapse the forced-local and credential checks into a single backend choice.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let force_local = lookup("FORCE_LOCAL_CREW")
            .map(|v| matches!(v.as_str(), "1" | "true" | "True"))
            .unwrap_or(false);
        if force_local {
            return Self::local();
        }

        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.is_empty())
            .or_else(|| lookup("CREWAI_API_KEY").filter(|k| !k.is_empty()));
        let Some(api_key) = api_key else {
            return Self::local();
        };

        let timeout_secs = lookup("CREW_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CREW_TIMEOUT_SECS);

        Self {
            backend: CrewBackend::Remote {
                api_key,
                base_url: lookup("CREW_API_URL").unwrap_or_else(|| DEFAULT_CREW_URL.to_string()),
                model: lookup("CREW_MODEL").unwrap_or_else(|| DEFAULT_CREW_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        }
    }
}

/// Everything the application needs to initialise.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub model_path: PathBuf,
    pub crew: CrewConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DELAY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            model_path: std::env::var("DELAY_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            crew: CrewConfig::from_env(),
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, model_path: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(path) = model_path {
            self.model_path = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> CrewConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CrewConfig::resolve(|key| map.get(key).cloned())
    }

    #[test]
    fn test_no_credentials_is_local() {
        assert_eq!(resolve(&[]).backend, CrewBackend::Local);
        assert_eq!(resolve(&[("OPENAI_API_KEY", "")]).backend, CrewBackend::Local);
    }

    #[test]
    fn test_force_local_wins_over_credentials() {
        for flag in ["1", "true", "True"] {
            let cfg = resolve(&[("FORCE_LOCAL_CREW", flag), ("OPENAI_API_KEY", "sk-test")]);
            assert_eq!(cfg.backend, CrewBackend::Local);
        }
        let cfg = resolve(&[("FORCE_LOCAL_CREW", "0"), ("OPENAI_API_KEY", "sk-test")]);
        assert!(matches!(cfg.backend, CrewBackend::Remote { .. }));
    }

    #[test]
    fn test_remote_settings() {
        let cfg = resolve(&[
            ("CREWAI_API_KEY", "crew-key"),
            ("CREW_MODEL", "llama3"),
            ("CREW_TIMEOUT_SECS", "5"),
        ]);
        match cfg.backend {
            CrewBackend::Remote {
                api_key,
                base_url,
                model,
                timeout,
            } => {
                assert_eq!(api_key, "crew-key");
                assert_eq!(base_url, DEFAULT_CREW_URL);
                assert_eq!(model, "llama3");
                assert_eq!(timeout, Duration::from_secs(5));
            }
            CrewBackend::Local => panic!("expected remote backend"),
        }
    }
}
