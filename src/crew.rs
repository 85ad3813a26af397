//! Advisory crew: free-text elaboration of corrective actions.
//!
//! Callers only see `Crew::run`. The backend is picked once from [`CrewConfig`]:
//! either a deterministic offline responder or an OpenAI-compatible
//! chat-completions endpoint prompted with a panel of logistics advisors.

use crate::config::{CrewBackend, CrewConfig};
use crate::error::CrewError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Text-generation collaborator. Output is advisory prose, never structured data.
pub trait Crew: Send + Sync {
    fn run(&self, prompt: &str) -> Result<String, CrewError>;

    fn name(&self) -> &'static str;
}

/// Offline crew with a fixed three-step answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCrew;

pub const LOCAL_CREW_RESPONSE: &str = "1) Re-route to avoid congestion.\n\
2) Prioritize urgent shipments and reassign resources.\n\
3) Notify customers with updated ETAs.";

impl Crew for LocalCrew {
    fn run(&self, prompt: &str) -> Result<String, CrewError> {
        debug!(prompt_len = prompt.len(), "Local crew answering");
        Ok(LOCAL_CREW_RESPONSE.to_string())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// A member of the advisory panel described to the remote model.
#[derive(Debug, Clone, Copy)]
pub struct Advisor {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
}

pub const ADVISORS: [Advisor; 6] = [
    Advisor {
        name: "DataLoaderAgent",
        role: "Data Loader and Cleaner",
        goal: "Load and preprocess all logistics datasets into a clean table.",
    },
    Advisor {
        name: "PerformanceAnalystAgent",
        role: "Delivery Performance Analyst",
        goal: "Analyze delays, compute KPIs, and highlight underperforming routes.",
    },
    Advisor {
        name: "RouteOptimizerAgent",
        role: "Route Optimization Strategist",
        goal: "Identify the most efficient routes using distance, weather, and cost data.",
    },
    Advisor {
        name: "FleetAdvisorAgent",
        role: "Fleet Efficiency Advisor",
        goal: "Recommend optimal vehicles based on efficiency and CO2 impact.",
    },
    Advisor {
        name: "InsightReporterAgent",
        role: "Insight Summarizer",
        goal: "Generate human-readable insights and summaries for management.",
    },
    Advisor {
        name: "PredictiveAdvisorAgent",
        role: "Predictive Risk and Action Advisor",
        goal: "Interpret delay predictions and suggest proactive corrective actions.",
    },
];

fn system_prompt() -> String {
    let mut prompt = String::from(
        "You are a panel of logistics specialists answering as one team. Members:\n",
    );
    for advisor in ADVISORS {
        prompt.push_str(&format!("- {} ({}): {}\n", advisor.name, advisor.role, advisor.goal));
    }
    prompt.push_str("Answer concisely with numbered steps.");
    prompt
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Crew backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct RemoteCrew {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl RemoteCrew {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }
}

impl Crew for RemoteCrew {
    fn run(&self, prompt: &str) -> Result<String, CrewError> {
        // Built per call so the blocking client never outlives the worker thread it runs on.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let system = system_prompt();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(CrewError::Status { status, body });
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CrewError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Build the crew chosen by `config`. Never fails.
pub fn build_crew(config: &CrewConfig) -> Box<dyn Crew> {
    match &config.backend {
        CrewBackend::Local => Box::new(LocalCrew),
        CrewBackend::Remote {
            api_key,
            base_url,
            model,
            timeout,
        } => {
            debug!(%base_url, %model, "Using remote crew");
            Box::new(RemoteCrew::new(
                api_key.clone(),
                base_url.clone(),
                model.clone(),
                *timeout,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_crew_is_deterministic() {
        let crew = LocalCrew;
        let a = crew.run("plan A").unwrap();
        let b = crew.run("something else").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.lines().count(), 3);
    }

    #[test]
    fn test_build_local_by_default() {
        let crew = build_crew(&CrewConfig::local());
        assert_eq!(crew.name(), "local");
    }

    #[test]
    fn test_remote_failure_is_an_error_not_a_panic() {
        let crew = RemoteCrew::new(
            "sk-test".into(),
            "http://127.0.0.1:9/v1/".into(),
            "gpt-4o-mini".into(),
            Duration::from_millis(200),
        );
        assert!(crew.run("plan").is_err());
    }

    #[test]
    fn test_system_prompt_lists_all_advisors() {
        let prompt = system_prompt();
        for advisor in ADVISORS {
            assert!(prompt.contains(advisor.name));
        }
    }
}
