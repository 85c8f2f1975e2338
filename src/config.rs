//! Configuration management.
//!
//! Configuration is read from environment variables:
//! - `OPENROUTER_API_KEY` - Required. OpenRouter API key.
//! - `DEFAULT_MODEL` - Optional. LLM model identifier. Defaults to `openai/gpt-4o`.
//! - `MAX_ITERATIONS` - Optional. Max dispatch round trips per agent request. Defaults to `10`.
//! - `MAX_DEPTH` - Optional. Max recursive delegation depth. Defaults to `4`.
//! - `MAX_INVOCATIONS` - Optional. Max total capability invocations per root request. Defaults to `64`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Deadline for one agent request. Defaults to `600`.
//! - `FEW_SHOT_PATH` - Optional. Path to few-shot examples for the aggregation prompt.
//! - `TRIALS_PATH` - Optional. Path to the tab-separated trial extract read by the CLI.
//! - `SAFETY_SERVICE_URL`, `EFFICACY_SERVICE_URL`, `ENROLLMENT_SERVICE_URL`,
//!   `GRAPH_SERVICE_URL` - Optional. Base URLs of the domain knowledge services.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Base URLs of the delegate knowledge services.
///
/// Each is optional; a missing URL means the matching leaf capability reports
/// a delegate failure, which degrades to the no-solution sentinel upstream.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeConfig {
    pub safety_url: Option<String>,
    pub efficacy_url: Option<String>,
    pub enrollment_url: Option<String>,
    pub graph_url: Option<String>,
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: String,

    /// LLM model identifier (OpenRouter format)
    pub model: String,

    /// Maximum dispatch-loop round trips per agent request
    pub max_iterations: usize,

    /// Maximum recursive delegation depth (root agent is depth 1)
    pub max_depth: usize,

    /// Maximum total capability invocations per root request
    pub max_invocations: u64,

    /// Deadline for one agent request, in seconds
    pub request_timeout_secs: u64,

    /// Few-shot examples for the aggregation prompt
    pub few_shot_path: Option<PathBuf>,

    /// Tab-separated trial extract read by the CLI
    pub trials_path: Option<PathBuf>,

    /// Delegate knowledge services
    pub knowledge: KnowledgeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "openai/gpt-4o".to_string());

        let max_iterations = parse_env("MAX_ITERATIONS", 10)?;
        let max_depth = parse_env("MAX_DEPTH", 4)?;
        let max_invocations = parse_env("MAX_INVOCATIONS", 64)?;
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 600)?;

        let few_shot_path = std::env::var("FEW_SHOT_PATH").ok().map(PathBuf::from);
        let trials_path = std::env::var("TRIALS_PATH").ok().map(PathBuf::from);

        let knowledge = KnowledgeConfig {
            safety_url: std::env::var("SAFETY_SERVICE_URL").ok(),
            efficacy_url: std::env::var("EFFICACY_SERVICE_URL").ok(),
            enrollment_url: std::env::var("ENROLLMENT_SERVICE_URL").ok(),
            graph_url: std::env::var("GRAPH_SERVICE_URL").ok(),
        };

        Ok(Self {
            api_key,
            model,
            max_iterations,
            max_depth,
            max_invocations,
            request_timeout_secs,
            few_shot_path,
            trials_path,
            knowledge,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            max_iterations: 10,
            max_depth: 4,
            max_invocations: 64,
            request_timeout_secs: 600,
            few_shot_path: None,
            trials_path: None,
            knowledge: KnowledgeConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new("key".into(), "openai/gpt-4o".into());
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_invocations, 64);
        assert!(config.knowledge.safety_url.is_none());
    }
}
