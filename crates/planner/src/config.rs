//! Runtime configuration for the completion provider

use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::{
    RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_RETRIES,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS_ANALYSIS: u32 = 4096;
pub const MAX_TOKENS_CHAT: u32 = 1000;

#[derive(Clone)]
pub struct PlannerConfig {
    pub api_key: String,
    /// OPENAI_BASE_URL
    pub base_url: String,
    /// OPENAI_MODEL
    pub model: String,
    /// OPENAI_MAX_RETRIES, OPENAI_RETRY_DELAY_MS, OPENAI_TIMEOUT_SECS
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl PlannerConfig {
    /// Read from the process environment. Fails when `OPENAI_API_KEY` is
    /// unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = var("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match var(name) {
                None => Ok(default),
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name,
                    expected: "a non-negative integer",
                    value: raw,
                }),
            }
        };

        let max_retries = number("OPENAI_MAX_RETRIES", DEFAULT_MAX_RETRIES as u64)?;
        let max_retries = u32::try_from(max_retries).map_err(|_| ConfigError::Invalid {
            name: "OPENAI_MAX_RETRIES",
            expected: "a small integer",
            value: max_retries.to_string(),
        })?;

        Ok(Self {
            api_key,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry: RetryPolicy {
                max_retries,
                initial_delay: Duration::from_millis(number(
                    "OPENAI_RETRY_DELAY_MS",
                    DEFAULT_INITIAL_DELAY_MS,
                )?),
                attempt_timeout: Duration::from_secs(number(
                    "OPENAI_TIMEOUT_SECS",
                    DEFAULT_ATTEMPT_TIMEOUT_SECS,
                )?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let err = PlannerConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert_eq!(err.to_string(), "OPENAI_API_KEY environment variable is not set");

        let err = PlannerConfig::from_vars(vars(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_defaults() {
        let cfg = PlannerConfig::from_vars(vars(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert_eq!(cfg.retry.attempt_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let cfg = PlannerConfig::from_vars(vars(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_MAX_RETRIES", "5"),
            ("OPENAI_RETRY_DELAY_MS", "250"),
            ("OPENAI_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.initial_delay, Duration::from_millis(250));
        assert_eq!(cfg.retry.attempt_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let err = PlannerConfig::from_vars(vars(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPENAI_TIMEOUT_SECS must be a non-negative integer, got 'soon'"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = PlannerConfig::from_vars(vars(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{:?}", cfg).contains("sk-secret"));
    }
}
