//! Runtime configuration
//!
//! Both API credentials are mandatory; everything else has a default.
//! Values come from `.env` (via dotenv) and then the process environment.

use crate::error::AssistantError;
use crate::llm::BackoffPolicy;
use crate::Result;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EXCHANGE_RATE_BASE_URL: &str = "https://v6.exchangerate-api.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_api_key: String,
    pub exchange_rate_api_key: String,
    pub port: u16,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub exchange_rate_base_url: String,
    pub backoff: BackoffPolicy,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let google_api_key = non_blank("GOOGLE_API_KEY")
            .or_else(|| non_blank("GEMINI_API_KEY"))
            .ok_or_else(|| {
                AssistantError::Config(
                    "GOOGLE_API_KEY not found. Create a `.env` file next to the binary \
                     and add the line: GOOGLE_API_KEY='your_api_key_here'"
                        .to_string(),
                )
            })?;

        let exchange_rate_api_key = non_blank("EXCHANGE_RATE_API_KEY").ok_or_else(|| {
            AssistantError::Config(
                "EXCHANGE_RATE_API_KEY not found. Add the line: \
                 EXCHANGE_RATE_API_KEY='your_api_key_here' (from a service like ExchangeRate-API.com) \
                 to your `.env` file"
                    .to_string(),
            )
        })?;

        let port = match non_blank("PORT").or_else(|| non_blank("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AssistantError::Config(format!("PORT must be a valid port number, got '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let defaults = BackoffPolicy::default();

        let max_attempts = match non_blank("LLM_MAX_ATTEMPTS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AssistantError::Config(format!(
                        "LLM_MAX_ATTEMPTS must be a positive integer, got '{}'",
                        raw
                    ))
                })?,
            None => defaults.max_attempts,
        };

        let base_delay = match non_blank("LLM_BACKOFF_BASE_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse::<u64>().map_err(|_| {
                AssistantError::Config(format!(
                    "LLM_BACKOFF_BASE_MS must be a number of milliseconds, got '{}'",
                    raw
                ))
            })?),
            None => defaults.base_delay,
        };

        Ok(Self {
            google_api_key,
            exchange_rate_api_key,
            port,
            gemini_model: non_blank("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: non_blank("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            exchange_rate_base_url: non_blank("EXCHANGE_RATE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_BASE_URL.to_string()),
            backoff: BackoffPolicy {
                max_attempts,
                base_delay,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_both_keys() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("EXCHANGE_RATE_API_KEY", "x-key"),
        ]))
        .unwrap();

        assert_eq!(config.google_api_key, "g-key");
        assert_eq!(config.exchange_rate_api_key, "x-key");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.backoff.max_attempts, 5);
        assert_eq!(config.backoff.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_missing_google_key_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[("EXCHANGE_RATE_API_KEY", "x-key")]))
            .unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_blank_exchange_key_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("EXCHANGE_RATE_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("EXCHANGE_RATE_API_KEY"));
    }

    #[test]
    fn test_gemini_key_fallback_and_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "fallback"),
            ("EXCHANGE_RATE_API_KEY", "x-key"),
            ("API_PORT", "9090"),
            ("LLM_MAX_ATTEMPTS", "3"),
            ("LLM_BACKOFF_BASE_MS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.google_api_key, "fallback");
        assert_eq!(config.port, 9090);
        assert_eq!(config.backoff.max_attempts, 3);
        assert_eq!(config.backoff.base_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "g"),
            ("EXCHANGE_RATE_API_KEY", "x"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
    }
}
