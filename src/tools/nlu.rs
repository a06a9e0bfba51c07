//! NLU analysis panel

use super::{FinanceToolkit, ToolInputs, ToolOutcome};
use crate::error::AssistantError;
use crate::format::capitalize;
use crate::prompts::nlu_prompt;
use crate::render::{number, string_list, text_or, PanelView, Progress, Tone};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HEADING: &str = "Advanced NLU Analysis";
const TITLE: &str = "NLU Analysis";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NluRequest {
    pub text: String,
}

impl Default for NluRequest {
    fn default() -> Self {
        Self {
            text: "I'm feeling stressed about my high spending on groceries this month \
                   and need to find a way to save more money for my vacation."
                .to_string(),
        }
    }
}

impl NluRequest {
    pub fn validate(self) -> Result<Self> {
        if self.text.trim().is_empty() {
            return Err(AssistantError::Validation(
                "Please enter some text to analyze.".to_string(),
            ));
        }
        Ok(self)
    }
}

pub async fn run(toolkit: &FinanceToolkit, request: NluRequest) -> Result<ToolOutcome> {
    let inputs = request.validate()?;

    let output = toolkit.generate_json(&nlu_prompt(&inputs.text)).await?;
    let view = render(&inputs, &output);

    Ok(ToolOutcome {
        title: TITLE.to_string(),
        inputs: ToolInputs::NluAnalysis(inputs),
        output,
        view,
    })
}

/// Map a score in [-1, 1] onto a 0..=100 gauge.
pub fn sentiment_percent(score: f64) -> u8 {
    ((score + 1.0) * 50.0).clamp(0.0, 100.0) as u8
}

pub fn render(_inputs: &NluRequest, data: &Value) -> PanelView {
    let sentiment = capitalize(&text_or(data, "sentiment", "N/A"));
    let score = number(data, "sentiment_score").unwrap_or(0.0);

    let mut view = PanelView::new(HEADING);
    view.status("Analysis Complete!")
        .section("Summary", format!("*{}*", text_or(data, "summary", "N/A")))
        .progress(Progress {
            label: "Sentiment".to_string(),
            percent: sentiment_percent(score),
            note: format!("**{}** (Score: {:.2})", sentiment, score),
            tone: Tone::Neutral,
        })
        .metric("Detected Emotion", capitalize(&text_or(data, "emotion", "N/A")))
        .metric("User Intent", capitalize(&text_or(data, "intent", "N/A")))
        .tags("Keywords", string_list(data, "keywords"))
        .tags("Entities", string_list(data, "entities"));

    view.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::toolkit;
    use serde_json::json;

    #[test]
    fn test_blank_text_is_rejected() {
        let request = NluRequest {
            text: " \n ".into(),
        };
        assert!(matches!(request.validate(), Err(AssistantError::Validation(_))));
    }

    #[test]
    fn test_sentiment_gauge() {
        assert_eq!(sentiment_percent(-1.0), 0);
        assert_eq!(sentiment_percent(0.0), 50);
        assert_eq!(sentiment_percent(0.8), 90);
        assert_eq!(sentiment_percent(3.0), 100);
        assert_eq!(sentiment_percent(-7.5), 0);
    }

    #[tokio::test]
    async fn test_run_with_raw_json_reply() {
        let reply = r#"{"sentiment": "negative", "sentiment_score": -0.6, "emotion": "stress",
            "intent": "seeking advice", "summary": "Worried about groceries.",
            "keywords": ["groceries", "save"], "entities": []}"#;
        let (toolkit, generator) = toolkit(&[reply], 1.0);

        let outcome = run(&toolkit, NluRequest::default()).await.unwrap();
        assert_eq!(outcome.title, "NLU Analysis");
        assert!(generator.prompts()[0].contains("stressed about my high spending"));

        let view = &outcome.view;
        assert_eq!(view.sections[0].markdown, "*Worried about groceries.*");
        assert_eq!(view.progress[0].percent, 20);
        assert_eq!(view.progress[0].note, "**Negative** (Score: -0.60)");
        assert_eq!(view.metrics[0].value, "Stress");
        assert_eq!(view.metrics[1].value, "Seeking advice");
        assert_eq!(view.tags.len(), 1);
    }

    #[test]
    fn test_render_missing_keys() {
        let view = render(&NluRequest::default(), &json!({}));
        assert_eq!(view.sections[0].markdown, "*N/A*");
        assert_eq!(view.progress[0].percent, 50);
        assert_eq!(view.metrics[0].value, "N/a");
        assert!(view.tags.is_empty());
    }
}
