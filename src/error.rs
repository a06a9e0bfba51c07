//! Error types for the LefiBot finance assistant

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Failures of a single exchange-rate lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateLookupError {
    #[error("Network Error: could not reach the exchange rate API: {0}")]
    Network(String),

    #[error("API Error: {0}")]
    Api(String),

    #[error("API Response Error: the exchange rate response format was unexpected: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Startup
    // =============================

    #[error("Configuration Error: {0}")]
    Config(String),

    // =============================
    // Per-interaction failures
    // =============================

    #[error("{0}")]
    Validation(String),

    #[error("Could not retrieve real-time exchange rate. {0}")]
    RateLookup(#[from] RateLookupError),

    #[error("LLM quota exceeded: {0}")]
    Quota(String),

    #[error("We're having trouble reaching the service right now. Please wait a moment and try again.")]
    ServiceUnavailable,

    #[error("Prompt blocked by safety policy: {0}")]
    PromptBlocked(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("The AI response was not in a valid JSON format: {reason}")]
    MalformedModelOutput { reason: String, raw: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssistantError {
    /// Only quota / rate-limit failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssistantError::Quota(_))
    }

    /// Raw model text kept for diagnostics, when there is one.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AssistantError::MalformedModelOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AssistantError::Validation(_) => StatusCode::BAD_REQUEST,
            AssistantError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AssistantError::PromptBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AssistantError::ServiceUnavailable | AssistantError::Quota(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AssistantError::RateLookup(_)
            | AssistantError::Llm(_)
            | AssistantError::MalformedModelOutput { .. }
            | AssistantError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AssistantError::Config(_)
            | AssistantError::SerializationError(_)
            | AssistantError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_quota_is_retryable() {
        assert!(AssistantError::Quota("429".into()).is_retryable());
        assert!(!AssistantError::Llm("boom".into()).is_retryable());
        assert!(!AssistantError::PromptBlocked("SAFETY".into()).is_retryable());
        assert!(!AssistantError::ServiceUnavailable.is_retryable());
    }

    #[test]
    fn test_rate_errors_convert_and_map_to_bad_gateway() {
        let err: AssistantError = RateLookupError::Api("invalid-key".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("invalid-key"));
    }

    #[test]
    fn test_malformed_output_keeps_raw_text() {
        let err = AssistantError::MalformedModelOutput {
            reason: "no JSON object found".into(),
            raw: "Sure! Here you go".into(),
        };
        assert_eq!(err.raw_output(), Some("Sure! Here you go"));
        assert_eq!(AssistantError::ServiceUnavailable.raw_output(), None);
    }
}
