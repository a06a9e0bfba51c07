//! Spending insights panel
//!
//! Goal tracking is computed locally from the monthly surplus; the model only
//! supplies the narrative sections.

use super::{FinanceToolkit, ToolInputs, ToolOutcome};
use crate::error::AssistantError;
use crate::format::format_money;
use crate::parsing::{parse_expenses, parse_goals, ExpenseSheet, Goal};
use crate::prompts::spending_insight_prompt;
use crate::render::{markdown_or, PanelView, Progress, Tone};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HEADING: &str = "Advanced Spending Insights";
const TITLE: &str = "Spending Insights";
const GOAL_FORMAT_HINT: &str = "Please use the format: `Goal Name: Cost (Deadline months)`";

/// Detail sections in display order: (title, output key).
const DETAIL_SECTIONS: [(&str, &str); 5] = [
    ("Spending Breakdown (Fixed vs. Variable)", "spending_breakdown"),
    ("Needs vs. Wants Analysis", "needs_vs_wants"),
    ("Budgetary Red Flags", "red_flags"),
    ("Goal Feasibility Details", "goal_feasibility"),
    ("Top 3 Recommendations", "recommendations"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightRequest {
    pub income: f64,
    pub expenses: String,
    pub goals: String,
    pub currency: String,
}

impl Default for InsightRequest {
    fn default() -> Self {
        Self {
            income: 60000.0,
            expenses: "Rent: 20000, Groceries: 10000, Transport: 5000, Entertainment: 5000"
                .to_string(),
            goals: "Vacation: 50000 (6 months), New Phone: 80000 (12 months)".to_string(),
            currency: "₹".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightInputs {
    pub income: f64,
    pub expenses: ExpenseSheet,
    pub goals: Vec<Goal>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_expenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_goals: Vec<String>,
}

impl InsightRequest {
    pub fn validate(self) -> Result<InsightInputs> {
        if !self.income.is_finite() || self.income < 0.0 {
            return Err(AssistantError::Validation(
                "Monthly income cannot be negative.".to_string(),
            ));
        }

        let expenses = parse_expenses(&self.expenses);
        if expenses.expenses.is_empty() {
            return Err(AssistantError::Validation(
                "Please list at least one expense as `Name: amount`.".to_string(),
            ));
        }
        let goals = parse_goals(&self.goals);

        Ok(InsightInputs {
            income: self.income,
            expenses: expenses.expenses,
            goals: goals.goals,
            currency: self.currency.trim().to_string(),
            ignored_expenses: expenses.malformed,
            ignored_goals: goals.malformed,
        })
    }
}

impl InsightInputs {
    pub fn surplus(&self) -> f64 {
        self.income - self.expenses.total()
    }

    pub fn to_request(&self) -> InsightRequest {
        let goals = self
            .goals
            .iter()
            .map(|g| format!("{}: {} ({} months)", g.name, g.cost, g.deadline_months))
            .collect::<Vec<_>>()
            .join(", ");
        InsightRequest {
            income: self.income,
            expenses: self.expenses.to_input_text(),
            goals,
            currency: self.currency.clone(),
        }
    }
}

/// How a goal fares against the monthly surplus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalProjection {
    /// Infinite when there is no surplus.
    pub months_needed: f64,
    pub percent: u8,
    pub on_track: bool,
}

pub fn project_goal(goal: &Goal, surplus: f64) -> GoalProjection {
    let months_needed = if surplus > 0.0 {
        goal.cost / surplus
    } else {
        f64::INFINITY
    };
    let deadline = f64::from(goal.deadline_months);
    let progress = if months_needed > 0.0 {
        (deadline / months_needed * 100.0).min(100.0)
    } else {
        100.0
    };

    GoalProjection {
        months_needed,
        percent: progress.clamp(0.0, 100.0) as u8,
        on_track: months_needed <= deadline,
    }
}

pub async fn run(toolkit: &FinanceToolkit, request: InsightRequest) -> Result<ToolOutcome> {
    let inputs = request.validate()?;

    let prompt = spending_insight_prompt(
        inputs.income,
        &inputs.expenses,
        &inputs.goals,
        &inputs.currency,
    );
    let output = toolkit.generate_json(&prompt).await?;
    let view = render(&inputs, &output);

    Ok(ToolOutcome {
        title: TITLE.to_string(),
        inputs: ToolInputs::SpendingInsights(inputs),
        output,
        view,
    })
}

pub fn render(inputs: &InsightInputs, data: &Value) -> PanelView {
    let currency = inputs.currency.as_str();
    let surplus = inputs.surplus();

    let mut view = PanelView::new(HEADING);
    if !inputs.ignored_goals.is_empty() {
        view.warn(format!(
            "The following goals were ignored due to incorrect formatting: `{}`",
            inputs.ignored_goals.join(", ")
        ))
        .warn(GOAL_FORMAT_HINT);
    }
    if !inputs.ignored_expenses.is_empty() {
        view.warn(format!(
            "The following expenses were ignored due to incorrect formatting: `{}`",
            inputs.ignored_expenses.join(", ")
        ));
    }

    view.status("Insights Generated!")
        .metric("Total Income", format_money(currency, inputs.income))
        .metric("Total Expenses", format_money(currency, inputs.expenses.total()))
        .metric("Monthly Surplus", format_money(currency, surplus));

    let summary = markdown_or(data, "executive_summary", "");
    if !summary.is_empty() {
        view.section("Executive Summary", summary);
    }

    for goal in &inputs.goals {
        let projection = project_goal(goal, surplus);
        let (note, tone) = if projection.on_track {
            (
                format!(
                    "On track: Needs {:.1} months for a {}-month goal.",
                    projection.months_needed, goal.deadline_months
                ),
                Tone::Success,
            )
        } else {
            (
                format!(
                    "At risk: Needs {:.1} months, but deadline is {} months.",
                    projection.months_needed, goal.deadline_months
                ),
                Tone::Danger,
            )
        };
        view.progress(Progress {
            label: goal.name.clone(),
            percent: projection.percent,
            note,
            tone,
        });
    }

    for (title, key) in DETAIL_SECTIONS {
        view.section(title, markdown_or(data, key, "N/A"));
    }

    view.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fenced, toolkit};
    use serde_json::json;

    fn goal(cost: f64, months: u32) -> Goal {
        Goal {
            name: "Vacation".into(),
            cost,
            deadline_months: months,
        }
    }

    #[test]
    fn test_goal_projection() {
        // 50000 at 20000/month is 2.5 months, well inside 6
        let fine = project_goal(&goal(50000.0, 6), 20000.0);
        assert_eq!(fine.months_needed, 2.5);
        assert_eq!(fine.percent, 100);
        assert!(fine.on_track);

        // 80000 at 5000/month is 16 months against 12
        let late = project_goal(&goal(80000.0, 12), 5000.0);
        assert_eq!(late.months_needed, 16.0);
        assert_eq!(late.percent, 75);
        assert!(!late.on_track);

        let broke = project_goal(&goal(1000.0, 12), -500.0);
        assert!(broke.months_needed.is_infinite());
        assert_eq!(broke.percent, 0);
        assert!(!broke.on_track);

        let free = project_goal(&goal(0.0, 3), 100.0);
        assert_eq!(free.percent, 100);
        assert!(free.on_track);
    }

    #[test]
    fn test_validation() {
        let mut request = InsightRequest::default();
        request.expenses = "nothing useful".into();
        assert!(matches!(request.validate(), Err(AssistantError::Validation(_))));

        let mut request = InsightRequest::default();
        request.income = -1.0;
        assert!(request.validate().is_err());

        let mut request = InsightRequest::default();
        request.goals = "Car: 90000 in a year, Bike: 9000 (3 months)".into();
        let inputs = request.validate().unwrap();
        assert_eq!(inputs.goals.len(), 1);
        assert_eq!(inputs.ignored_goals, vec!["Car: 90000 in a year"]);
    }

    #[tokio::test]
    async fn test_run_with_default_form() {
        let reply = fenced(
            r#"{"executive_summary": "Solid footing.", "red_flags": ["Dining out is creeping up"]}"#,
        );
        let (toolkit, generator) = toolkit(&[reply.as_str()], 1.0);

        let outcome = run(&toolkit, InsightRequest::default()).await.unwrap();
        assert_eq!(outcome.title, "Spending Insights");
        assert!(generator.prompts()[0].contains("- Vacation: ₹50000 (Deadline: 6 months)"));

        let view = &outcome.view;
        assert!(view.warnings.is_empty());
        assert_eq!(view.metrics[2].value, "₹20,000.00");
        assert_eq!(view.sections[0].title, "Executive Summary");

        // Vacation: 2.5 months vs 6; New Phone: 4 months vs 12
        assert_eq!(view.progress.len(), 2);
        assert!(view.progress.iter().all(|p| p.tone == Tone::Success));
        assert_eq!(view.progress[1].note, "On track: Needs 4.0 months for a 12-month goal.");

        let red_flags = view.sections.iter().find(|s| s.title == "Budgetary Red Flags").unwrap();
        assert_eq!(red_flags.markdown, "- Dining out is creeping up");
        let recs = view.sections.iter().find(|s| s.title == "Top 3 Recommendations").unwrap();
        assert_eq!(recs.markdown, "N/A");
    }

    #[test]
    fn test_render_at_risk_and_warnings() {
        let request = InsightRequest {
            income: 10000.0,
            expenses: "Rent: 12000".into(),
            goals: "Car: 300000 (12 months), Holiday 5000".into(),
            currency: "$".into(),
        };
        let inputs = request.validate().unwrap();
        let view = render(&inputs, &json!({}));

        assert_eq!(view.warnings.len(), 2);
        assert_eq!(view.warnings[1], GOAL_FORMAT_HINT);
        assert_eq!(view.progress[0].tone, Tone::Danger);
        assert_eq!(view.progress[0].note, "At risk: Needs inf months, but deadline is 12 months.");
        assert_eq!(view.sections.len(), DETAIL_SECTIONS.len());
    }

    #[test]
    fn test_inputs_back_to_form() {
        let inputs = InsightRequest::default().validate().unwrap();
        assert_eq!(inputs.to_request(), InsightRequest::default());
    }
}
