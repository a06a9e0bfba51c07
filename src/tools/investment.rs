//! Investment planner panel

use super::{FinanceToolkit, ToolInputs, ToolOutcome};
use crate::error::AssistantError;
use crate::prompts::investment_prompt;
use crate::render::{label, markdown_or, number, present, Chart, PanelView, Point, Slice};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;

const HEADING: &str = "AI Investment Planner";
const TITLE: &str = "Investment Plan";
pub const YEARS_RANGE: RangeInclusive<u32> = 1..=40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub current_savings: f64,
    pub monthly_investment: f64,
    pub years_to_goal: u32,
    pub risk_tolerance: RiskTolerance,
    pub currency: String,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            current_savings: 25000.0,
            monthly_investment: 5000.0,
            years_to_goal: 10,
            risk_tolerance: RiskTolerance::Low,
            currency: "₹".to_string(),
        }
    }
}

impl PlanRequest {
    pub fn validate(self) -> Result<Self> {
        let amounts = [self.current_savings, self.monthly_investment];
        if amounts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AssistantError::Validation(
                "Savings and monthly investment cannot be negative.".to_string(),
            ));
        }
        if amounts.iter().all(|v| *v == 0.0) {
            return Err(AssistantError::Validation(
                "Please enter your current savings or a monthly investment amount.".to_string(),
            ));
        }
        if !YEARS_RANGE.contains(&self.years_to_goal) {
            return Err(AssistantError::Validation(format!(
                "Years to goal must be between {} and {}.",
                YEARS_RANGE.start(),
                YEARS_RANGE.end()
            )));
        }

        Ok(Self {
            currency: self.currency.trim().to_string(),
            ..self
        })
    }
}

pub async fn run(toolkit: &FinanceToolkit, request: PlanRequest) -> Result<ToolOutcome> {
    let inputs = request.validate()?;

    let prompt = investment_prompt(
        inputs.current_savings,
        inputs.monthly_investment,
        inputs.years_to_goal,
        &inputs.risk_tolerance.to_string(),
        &inputs.currency,
    );
    let output = toolkit.generate_json(&prompt).await?;
    let view = render(&inputs, &output);

    Ok(ToolOutcome {
        title: TITLE.to_string(),
        inputs: ToolInputs::InvestmentPlanner(inputs),
        output,
        view,
    })
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

pub fn render(_inputs: &PlanRequest, data: &Value) -> PanelView {
    let mut view = PanelView::new(HEADING);
    view.status("Plan Generated!")
        .section("Executive Summary", markdown_or(data, "summary", "N/A"));

    let slices: Vec<Slice> = present(data, "portfolio_breakdown")
        .map(rows)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| {
            Some(Slice {
                label: row.get("asset").and_then(label)?,
                value: number(row, "percentage")?,
            })
        })
        .collect();
    if slices.is_empty() {
        view.warn("Portfolio breakdown data is missing.");
    } else {
        view.chart(Chart::Pie {
            title: "Asset Allocation".to_string(),
            slices,
        });
    }

    let points: Vec<Point> = present(data, "projected_growth")
        .map(rows)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| {
            Some(Point {
                x: row.get("year").and_then(label)?,
                y: number(row, "value")?,
            })
        })
        .collect();
    if points.is_empty() {
        view.warn("Projected growth data is missing.");
    } else {
        view.chart(Chart::Line {
            title: "Hypothetical Account Value".to_string(),
            x_label: "Year".to_string(),
            y_label: "Value".to_string(),
            points,
        });
    }

    view.section("Action Plan", markdown_or(data, "action_plan", "N/A"));
    view.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fenced, toolkit};
    use serde_json::json;

    #[test]
    fn test_validation() {
        let zero = PlanRequest {
            current_savings: 0.0,
            monthly_investment: 0.0,
            ..PlanRequest::default()
        };
        assert!(matches!(zero.validate(), Err(AssistantError::Validation(_))));

        for years in [0, 41] {
            let request = PlanRequest {
                years_to_goal: years,
                ..PlanRequest::default()
            };
            assert!(request.validate().is_err());
        }

        let only_monthly = PlanRequest {
            current_savings: 0.0,
            years_to_goal: 40,
            ..PlanRequest::default()
        };
        assert!(only_monthly.validate().is_ok());
    }

    #[test]
    fn test_risk_parsing() {
        let request: PlanRequest =
            serde_json::from_value(json!({"risk_tolerance": "High"})).unwrap();
        assert_eq!(request.risk_tolerance, RiskTolerance::High);
        assert_eq!(request.years_to_goal, 10);
        assert!(serde_json::from_value::<PlanRequest>(json!({"risk_tolerance": "YOLO"})).is_err());
    }

    #[tokio::test]
    async fn test_run_renders_charts() {
        let reply = fenced(
            r#"{
                "summary": "A balanced plan.",
                "portfolio_breakdown": [
                    {"asset": "Stocks", "percentage": 60},
                    {"asset": "Bonds", "percentage": "30%"},
                    {"asset": "Gold", "percentage": 10}
                ],
                "projected_growth": [
                    {"year": 1, "value": 91000},
                    {"year": 2, "value": 162000}
                ],
                "action_plan": ["Open a brokerage account", "Automate monthly transfers"]
            }"#,
        );
        let (toolkit, generator) = toolkit(&[reply.as_str()], 1.0);
        let request = PlanRequest {
            risk_tolerance: RiskTolerance::Medium,
            ..PlanRequest::default()
        };

        let outcome = run(&toolkit, request).await.unwrap();
        assert_eq!(outcome.title, "Investment Plan");
        assert!(generator.prompts()[0].contains("- Risk Tolerance: Medium"));

        let view = &outcome.view;
        assert!(view.warnings.is_empty());
        match &view.charts[0] {
            Chart::Pie { slices, .. } => {
                assert_eq!(slices.len(), 3);
                assert_eq!(slices[1].value, 30.0);
            }
            other => panic!("unexpected chart {:?}", other),
        }
        match &view.charts[1] {
            Chart::Line { points, .. } => assert_eq!(points[1].x, "2"),
            other => panic!("unexpected chart {:?}", other),
        }
        assert_eq!(
            view.sections[1].markdown,
            "- Open a brokerage account\n- Automate monthly transfers"
        );
    }

    #[test]
    fn test_render_missing_data() {
        let view = render(&PlanRequest::default(), &json!({"portfolio_breakdown": []}));
        assert_eq!(
            view.warnings,
            vec![
                "Portfolio breakdown data is missing.".to_string(),
                "Projected growth data is missing.".to_string()
            ]
        );
        assert_eq!(view.sections[0].markdown, "N/A");
        assert!(view.charts.is_empty());
    }
}
