//! Interaction Classifier
//!
//! Classifies a chat message, using its NLU analysis, as either:
//! - Conversational: answered in the chat (e.g., "what is an index fund?")
//! - Redirect: better served by a tool panel (e.g., a stressed user listing
//!   expenses goes to the Budget Analyzer)

use crate::tools::ToolKind;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "tool", rename_all = "snake_case")]
pub enum InteractionType {
    Conversational,
    Redirect(ToolKind),
}

const BUDGET_INTENT: &str = "budget_analysis";
const INVESTMENT_INTENT: &str = "investment_planning";

/// Emotions that make a budget question worth a redirect
const DISTRESS_EMOTIONS: &[&str] = &["stress", "concern"];

/// The two NLU fields the redirect decision looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NluSignal {
    pub intent: Option<String>,
    pub emotion: Option<String>,
}

impl NluSignal {
    /// Missing or non-string fields are simply absent.
    pub fn from_value(data: &Value) -> Self {
        let field = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_lowercase())
        };
        Self {
            intent: field("intent"),
            emotion: field("emotion"),
        }
    }
}

/// Interaction classifier
pub struct InteractionClassifier;

impl InteractionClassifier {
    pub fn classify(signal: &NluSignal) -> InteractionType {
        let emotion = signal.emotion.as_deref().unwrap_or_default();

        match signal.intent.as_deref() {
            Some(BUDGET_INTENT) if DISTRESS_EMOTIONS.contains(&emotion) => {
                InteractionType::Redirect(ToolKind::BudgetAnalyzer)
            }
            Some(INVESTMENT_INTENT) => InteractionType::Redirect(ToolKind::InvestmentPlanner),
            _ => InteractionType::Conversational,
        }
    }

    pub fn classify_value(data: &Value) -> InteractionType {
        Self::classify(&NluSignal::from_value(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_budget_redirect_needs_distress() {
        for emotion in ["stress", "concern", " Stress "] {
            let data = json!({"intent": "budget_analysis", "emotion": emotion});
            assert_eq!(
                InteractionClassifier::classify_value(&data),
                InteractionType::Redirect(ToolKind::BudgetAnalyzer)
            );
        }

        let calm = json!({"intent": "budget_analysis", "emotion": "joy"});
        assert_eq!(
            InteractionClassifier::classify_value(&calm),
            InteractionType::Conversational
        );
    }

    #[test]
    fn test_investment_redirect_ignores_emotion() {
        let cases = vec![
            json!({"intent": "investment_planning"}),
            json!({"intent": "investment_planning", "emotion": "optimism"}),
        ];

        for c in cases {
            assert_eq!(
                InteractionClassifier::classify_value(&c),
                InteractionType::Redirect(ToolKind::InvestmentPlanner)
            );
        }
    }

    #[test]
    fn test_edge_cases() {
        let cases = vec![
            json!({}),
            json!({"intent": "seeking advice", "emotion": "stress"}),
            json!({"intent": 42, "emotion": null}),
            json!({"emotion": "concern"}),
        ];

        for c in cases {
            assert_eq!(
                InteractionClassifier::classify_value(&c),
                InteractionType::Conversational
            );
        }
    }

    #[test]
    fn test_serialization() {
        let redirect = InteractionType::Redirect(ToolKind::BudgetAnalyzer);
        assert_eq!(
            serde_json::to_value(redirect).unwrap(),
            json!({"type": "redirect", "tool": "budget-analyzer"})
        );
    }
}
