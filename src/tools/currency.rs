//! Currency converter panel
//!
//! Fetches the live pair rate, then asks the model for the converted amount,
//! a 30-day trend and (optionally) the rate on a past date.

use super::{FinanceToolkit, ToolInputs, ToolOutcome};
use crate::currency;
use crate::error::AssistantError;
use crate::format::format_amount;
use crate::prompts::currency_prompt;
use crate::render::{number, present, text_or, Chart, PanelView, Point};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HEADING: &str = "Advanced Currency Converter";
pub const MIN_AMOUNT: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub is_historical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_date: Option<NaiveDate>,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            from_currency: "USD".to_string(),
            to_currency: "INR".to_string(),
            amount: 100.0,
            is_historical: false,
            lookup_date: None,
        }
    }
}

impl ConversionRequest {
    /// Defaults as shown on the form: the date picker starts at yesterday.
    pub fn form_default(today: NaiveDate) -> Self {
        Self {
            lookup_date: today.pred_opt(),
            ..Self::default()
        }
    }

    /// Normalize codes and resolve the lookup date against `today`.
    pub fn validate(self, today: NaiveDate) -> Result<Self> {
        let from = self.from_currency.trim().to_uppercase();
        let to = self.to_currency.trim().to_uppercase();
        if from.is_empty() || to.is_empty() {
            return Err(AssistantError::Validation(
                "Please fill in all currency fields.".to_string(),
            ));
        }
        for code in [&from, &to] {
            if !currency::is_supported(code) {
                return Err(AssistantError::Validation(format!(
                    "Unsupported currency code: {}",
                    code
                )));
            }
        }

        if !self.amount.is_finite() || self.amount < MIN_AMOUNT {
            return Err(AssistantError::Validation(format!(
                "Amount must be at least {}.",
                MIN_AMOUNT
            )));
        }

        let lookup_date = if self.is_historical {
            let yesterday = today.pred_opt().unwrap_or(today);
            let date = self.lookup_date.unwrap_or(yesterday);
            if date > yesterday {
                return Err(AssistantError::Validation(format!(
                    "Historical date must be on or before {}.",
                    yesterday
                )));
            }
            Some(date)
        } else {
            None
        };

        Ok(Self {
            from_currency: from,
            to_currency: to,
            amount: self.amount,
            is_historical: self.is_historical,
            lookup_date,
        })
    }

    pub fn title(&self) -> String {
        format!(
            "Conv: {} {}→{}",
            self.amount, self.from_currency, self.to_currency
        )
    }
}

pub async fn run(
    toolkit: &FinanceToolkit,
    request: ConversionRequest,
    today: NaiveDate,
) -> Result<ToolOutcome> {
    let inputs = request.validate(today)?;

    let rate = toolkit
        .rates()
        .pair_rate(&inputs.from_currency, &inputs.to_currency)
        .await?;

    let prompt = currency_prompt(
        &inputs.from_currency,
        &inputs.to_currency,
        inputs.amount,
        rate,
        inputs.lookup_date,
    );
    let output = toolkit.generate_json(&prompt).await?;
    let view = render(&inputs, &output);

    Ok(ToolOutcome {
        title: inputs.title(),
        inputs: ToolInputs::CurrencyConverter(inputs),
        output,
        view,
    })
}

fn conversion_card(data: &Value, inputs: &ConversionRequest, converted: f64) -> String {
    format!(
        "**{}**\n\n{} {} = **{} {}**",
        text_or(data, "explanation", "Explanation not available."),
        format_amount(inputs.amount),
        inputs.from_currency,
        format_amount(converted),
        inputs.to_currency
    )
}

fn parse_trend_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

pub fn render(inputs: &ConversionRequest, data: &Value) -> PanelView {
    let mut view = PanelView::new(HEADING);

    let Some(real_time) = data.get("real_time").filter(|v| v.is_object()) else {
        return view
            .warn("The AI response did not contain the expected structure. Please try again.")
            .build();
    };

    view.status("Data retrieved successfully!");
    match number(real_time, "converted_amount") {
        Some(converted) => {
            view.section(
                "Real-Time Conversion",
                conversion_card(real_time, inputs, converted),
            );
        }
        None => {
            view.warn(
                "The AI's response for the real-time conversion was incomplete. \
                 Please try again or adjust your query.",
            );
        }
    }
    if let Some(rate) = number(real_time, "rate") {
        view.metric(
            format!("1 {} in {}", inputs.from_currency, inputs.to_currency),
            format!("{:.4}", rate),
        );
    }

    if let (true, Some(date), Some(historical)) = (
        inputs.is_historical,
        inputs.lookup_date,
        present(data, "historical_rate"),
    ) {
        match number(historical, "converted_amount") {
            Some(converted) => {
                view.section(
                    format!("Historical Rate for {}", date.format("%B %d, %Y")),
                    conversion_card(historical, inputs, converted),
                );
            }
            None => {
                view.warn("Historical conversion data was incomplete in the AI response.");
            }
        }
    }

    if let Some(trend) = present(data, "historical_trend") {
        render_trend(&mut view, trend);
    }

    view.build()
}

fn render_trend(view: &mut PanelView, trend: &Value) {
    let rows = match trend.as_array() {
        Some(rows) if rows.iter().all(Value::is_object) => rows,
        _ => {
            view.warn("Trend data is not in the expected list format.");
            return;
        }
    };

    let has_columns = rows.iter().any(|r| r.get("date").is_some())
        && rows.iter().any(|r| r.get("rate").is_some());
    if !has_columns {
        view.warn("Trend data was missing 'date' or 'rate' columns.");
        return;
    }

    // rows with unreadable dates are dropped
    let points = rows
        .iter()
        .filter_map(|row| {
            let date = row.get("date").and_then(Value::as_str).and_then(parse_trend_date)?;
            let rate = number(row, "rate")?;
            Some(Point {
                x: date.format("%Y-%m-%d").to_string(),
                y: rate,
            })
        })
        .collect();

    view.chart(Chart::Line {
        title: "30-Day Exchange Rate Trend".to_string(),
        x_label: "Date".to_string(),
        y_label: "Rate".to_string(),
        points,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RateLookupError;
    use crate::exchange_rate::StaticRateProvider;
    use crate::llm::{BackoffPolicy, LlmClient, ScriptedGenerator};
    use crate::tools::test_support::{fenced, toolkit};
    use serde_json::json;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(from: &str, to: &str, amount: f64) -> ConversionRequest {
        ConversionRequest {
            from_currency: from.into(),
            to_currency: to.into(),
            amount,
            ..ConversionRequest::default()
        }
    }

    #[test]
    fn test_validate_normalizes_codes() {
        let inputs = request(" usd", "eur ", 10.0).validate(day(2024, 3, 16)).unwrap();
        assert_eq!(inputs.from_currency, "USD");
        assert_eq!(inputs.to_currency, "EUR");
        assert_eq!(inputs.lookup_date, None);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let today = day(2024, 3, 16);
        let cases = [
            request("USD", "XYZ", 10.0),
            request("", "INR", 10.0),
            request("USD", "INR", 0.001),
            request("USD", "INR", f64::NAN),
        ];
        for case in cases {
            assert!(matches!(case.validate(today), Err(AssistantError::Validation(_))));
        }
    }

    #[test]
    fn test_historical_date_rules() {
        let today = day(2024, 3, 16);
        let mut req = request("USD", "INR", 10.0);
        req.is_historical = true;

        let defaulted = req.clone().validate(today).unwrap();
        assert_eq!(defaulted.lookup_date, Some(day(2024, 3, 15)));

        req.lookup_date = Some(today);
        assert!(req.clone().validate(today).is_err());

        req.lookup_date = Some(day(2023, 1, 1));
        assert_eq!(req.validate(today).unwrap().lookup_date, Some(day(2023, 1, 1)));
    }

    #[test]
    fn test_non_historical_drops_date() {
        let form = ConversionRequest::form_default(day(2024, 3, 16));
        assert_eq!(form.lookup_date, Some(day(2024, 3, 15)));
        assert_eq!(form.validate(day(2024, 3, 16)).unwrap().lookup_date, None);
    }

    #[tokio::test]
    async fn test_run_uses_live_rate() {
        let reply = fenced(
            r#"{
                "real_time": {"rate": 83.25, "converted_amount": 8325.0, "explanation": "USD to INR today."},
                "historical_trend": [
                    {"date": "2024-03-14", "rate": 83.1},
                    {"date": "not a date", "rate": 83.0},
                    {"date": "2024-03-15T00:00:00", "rate": 83.2}
                ]
            }"#,
        );
        let (toolkit, generator) = toolkit(&[reply.as_str()], 83.25);

        let outcome = run(&toolkit, request("USD", "INR", 100.0), day(2024, 3, 16))
            .await
            .unwrap();

        assert_eq!(outcome.title, "Conv: 100 USD→INR");
        assert!(generator.prompts()[0].contains("from USD to INR is 83.25"));
        assert_eq!(outcome.output["real_time"]["converted_amount"], 8325.0);

        let view = &outcome.view;
        assert!(view.warnings.is_empty());
        assert!(view.sections[0].markdown.contains("100.00 USD = **8,325.00 INR**"));
        match &view.charts[0] {
            Chart::Line { points, .. } => {
                let dates: Vec<&str> = points.iter().map(|p| p.x.as_str()).collect();
                assert_eq!(dates, vec!["2024-03-14", "2024-03-15"]);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_failure_skips_the_model() {
        let generator = ScriptedGenerator::new();
        let llm = LlmClient::new(Arc::new(generator.clone()), BackoffPolicy::default());
        let rates = StaticRateProvider::failing(RateLookupError::Api("invalid-key".into()));
        let toolkit = FinanceToolkit::new(llm, Arc::new(rates));

        let err = run(&toolkit, request("USD", "INR", 100.0), day(2024, 3, 16))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::RateLookup(RateLookupError::Api(_))));
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_render_historical_card() {
        let mut inputs = request("USD", "EUR", 50.0);
        inputs.is_historical = true;
        inputs.lookup_date = Some(day(2024, 3, 15));
        let data = json!({
            "real_time": {"converted_amount": 46.0},
            "historical_rate": {"rate": 0.91, "explanation": "Back then."}
        });

        let view = render(&inputs, &data);
        assert_eq!(view.sections.len(), 1);
        assert_eq!(
            view.warnings,
            vec!["Historical conversion data was incomplete in the AI response.".to_string()]
        );

        let data = json!({
            "real_time": {"converted_amount": 46.0},
            "historical_rate": {"converted_amount": 45.5}
        });
        let view = render(&inputs, &data);
        assert_eq!(view.sections[1].title, "Historical Rate for March 15, 2024");
    }

    #[test]
    fn test_render_unexpected_shapes() {
        let inputs = request("USD", "INR", 1.0);

        let view = render(&inputs, &json!({"rate": 83}));
        assert!(view.status.is_none());
        assert_eq!(view.warnings.len(), 1);

        let view = render(
            &inputs,
            &json!({"real_time": {}, "historical_trend": "up and to the right"}),
        );
        assert_eq!(view.warnings.len(), 2);
        assert!(view.warnings[1].contains("expected list format"));

        let view = render(
            &inputs,
            &json!({"real_time": {"converted_amount": 83}, "historical_trend": [{"day": 1}]}),
        );
        assert!(view.warnings[0].contains("missing 'date' or 'rate'"));
        assert!(view.charts.is_empty());
    }
}
