//! JSON extraction from free-form model output
//!
//! Models are asked for strict JSON but often wrap it in a ```json fence with
//! prose around it. Look for the fence first, fall back to the whole reply.

use crate::error::AssistantError;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("fenced JSON pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Fenced,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed { value: Value, source: ExtractionSource },
    /// Neither a fenced block nor anything resembling JSON.
    NotFound,
    /// Something JSON-shaped was located but did not decode.
    Invalid { error: String },
}

impl Extraction {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Extraction::Parsed { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Convert to a `Result`, keeping the raw reply for diagnostics on failure.
    pub fn into_value(self, raw: &str) -> Result<Value> {
        match self {
            Extraction::Parsed { value, .. } => Ok(value),
            Extraction::NotFound => Err(AssistantError::MalformedModelOutput {
                reason: "no JSON found in the AI response".to_string(),
                raw: raw.to_string(),
            }),
            Extraction::Invalid { error } => Err(AssistantError::MalformedModelOutput {
                reason: error,
                raw: raw.to_string(),
            }),
        }
    }
}

pub fn extract_json(text: &str) -> Extraction {
    if let Some(captures) = FENCED_JSON.captures(text) {
        let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        return match serde_json::from_str::<Value>(body) {
            Ok(value) => Extraction::Parsed {
                value,
                source: ExtractionSource::Fenced,
            },
            Err(e) => Extraction::Invalid {
                error: e.to_string(),
            },
        };
    }

    let trimmed = text.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Extraction::Parsed {
            value,
            source: ExtractionSource::Raw,
        },
        Err(e) if trimmed.starts_with('{') || trimmed.starts_with('[') => Extraction::Invalid {
            error: e.to_string(),
        },
        Err(_) => Extraction::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block_inside_prose() {
        let text = "Sure! Here is your analysis:\n```json\n{\"summary\": \"ok\", \"keywords\": [\"rent\"]}\n```\nLet me know if you need more.";
        assert_eq!(
            extract_json(text),
            Extraction::Parsed {
                value: json!({"summary": "ok", "keywords": ["rent"]}),
                source: ExtractionSource::Fenced,
            }
        );
    }

    #[test]
    fn test_first_fenced_block_wins() {
        let text = "```json\n{\"a\": 1}\n```\nand also\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_json(text).value(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_nested_objects_in_fence() {
        let text = "```json\n{\"real_time\": {\"rate\": 1.5, \"converted_amount\": 150}}\n```";
        assert_eq!(
            extract_json(text).value(),
            Some(&json!({"real_time": {"rate": 1.5, "converted_amount": 150}}))
        );
    }

    #[test]
    fn test_raw_json_fallback() {
        let text = "  {\"sentiment\": \"neutral\"}\n";
        assert_eq!(
            extract_json(text),
            Extraction::Parsed {
                value: json!({"sentiment": "neutral"}),
                source: ExtractionSource::Raw,
            }
        );
    }

    #[test]
    fn test_empty_object_is_a_success() {
        assert_eq!(extract_json("{}").value(), Some(&json!({})));
    }

    #[test]
    fn test_prose_only_is_not_found() {
        assert_eq!(extract_json("I cannot help with that."), Extraction::NotFound);
        assert_eq!(extract_json(""), Extraction::NotFound);
    }

    #[test]
    fn test_broken_fence_is_invalid() {
        let text = "```json\n{\"a\": 1,}\n```";
        assert!(matches!(extract_json(text), Extraction::Invalid { .. }));
    }

    #[test]
    fn test_broken_raw_json_is_invalid() {
        assert!(matches!(extract_json("{\"a\": "), Extraction::Invalid { .. }));
    }

    #[test]
    fn test_into_value_keeps_raw_text() {
        let raw = "no json here";
        let err = extract_json(raw).into_value(raw).unwrap_err();
        assert_eq!(err.raw_output(), Some(raw));
    }
}
