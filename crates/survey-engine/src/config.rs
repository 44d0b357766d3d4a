//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::timer::Timings;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/generate-results";

pub const ENV_ENDPOINT: &str = "SURVEY_RESULTS_ENDPOINT";
pub const ENV_SECTION_HEADER_DELAY: &str = "SURVEY_SECTION_HEADER_DELAY_MS";
pub const ENV_LOADING_DELAY: &str = "SURVEY_LOADING_DELAY_MS";
pub const ENV_AUTO_ADVANCE_DELAY: &str = "SURVEY_AUTO_ADVANCE_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT: &str = "SURVEY_REQUEST_TIMEOUT_SECS";

/// Settings shared by the navigator and the results submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Endpoint receiving the collected answers.
    pub endpoint: String,
    /// How long a first-visit section header stays on screen.
    pub section_header_delay: Duration,
    /// Pacing of the `loading` step before results are shown.
    pub loading_delay: Duration,
    /// Pause between picking an auto-advancing option and moving on.
    pub auto_advance_delay: Duration,
    /// Upper bound for the results request.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            section_header_delay: Duration::from_millis(1800),
            loading_delay: Duration::from_millis(2000),
            auto_advance_delay: Duration::from_millis(250),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SURVEY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|value| !value.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_SECTION_HEADER_DELAY) {
            config.section_header_delay =
                Duration::from_millis(parse_u64(ENV_SECTION_HEADER_DELAY, &raw)?);
        }
        if let Some(raw) = lookup(ENV_LOADING_DELAY) {
            config.loading_delay =
                Duration::from_millis(parse_u64(ENV_LOADING_DELAY, &raw)?);
        }
        if let Some(raw) = lookup(ENV_AUTO_ADVANCE_DELAY) {
            config.auto_advance_delay =
                Duration::from_millis(parse_u64(ENV_AUTO_ADVANCE_DELAY, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = Duration::from_secs(parse_u64(ENV_REQUEST_TIMEOUT, &raw)?);
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timings(&self) -> Timings {
        Timings {
            section_header: self.section_header_delay,
            loading: self.loading_delay,
            auto_advance: self.auto_advance_delay,
        }
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' is not a whole number ({err})"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_without_overrides() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn overrides_are_applied() {
        let vars = HashMap::from([
            (ENV_ENDPOINT, "https://results.example/api"),
            (ENV_SECTION_HEADER_DELAY, "10"),
            (ENV_REQUEST_TIMEOUT, " 5 "),
        ]);
        let config =
            EngineConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string())).unwrap();
        assert_eq!(config.endpoint, "https://results.example/api");
        assert_eq!(config.section_header_delay, Duration::from_millis(10));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.loading_delay, Duration::from_millis(2000));
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let err = EngineConfig::from_lookup(|key| {
            (key == ENV_LOADING_DELAY).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_LOADING_DELAY));
    }
}
