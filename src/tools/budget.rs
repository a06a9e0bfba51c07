//! Budget analyzer panel

use super::{FinanceToolkit, ToolInputs, ToolOutcome};
use crate::error::AssistantError;
use crate::format::format_money;
use crate::parsing::{parse_expenses, ExpenseSheet};
use crate::prompts::budget_summary_prompt;
use crate::render::{markdown_or, string_list, Chart, PanelView, Slice};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HEADING: &str = "Budget Analyzer";
const TITLE: &str = "Budget Analysis";

/// Form fields as typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetRequest {
    pub income: f64,
    pub expenses: String,
    pub currency: String,
}

impl Default for BudgetRequest {
    fn default() -> Self {
        Self {
            income: 50000.0,
            expenses: "Rent: 15000, Groceries: 8000, Transport: 3000, Entertainment: 4000"
                .to_string(),
            currency: "₹".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInputs {
    pub income: f64,
    pub expenses: ExpenseSheet,
    pub currency: String,
    /// Fragments that could not be read as `Name: amount`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

impl BudgetRequest {
    pub fn validate(self) -> Result<BudgetInputs> {
        let parsed = parse_expenses(&self.expenses);
        if !self.income.is_finite() || self.income <= 0.0 || parsed.expenses.is_empty() {
            return Err(AssistantError::Validation(
                "Please provide both income and expenses.".to_string(),
            ));
        }

        Ok(BudgetInputs {
            income: self.income,
            expenses: parsed.expenses,
            currency: self.currency.trim().to_string(),
            ignored: parsed.malformed,
        })
    }
}

impl BudgetInputs {
    pub fn to_request(&self) -> BudgetRequest {
        BudgetRequest {
            income: self.income,
            expenses: self.expenses.to_input_text(),
            currency: self.currency.clone(),
        }
    }
}

pub async fn run(toolkit: &FinanceToolkit, request: BudgetRequest) -> Result<ToolOutcome> {
    let inputs = request.validate()?;

    let prompt = budget_summary_prompt(inputs.income, &inputs.expenses, &inputs.currency);
    let output = toolkit.generate_json(&prompt).await?;
    let view = render(&inputs, &output);

    Ok(ToolOutcome {
        title: TITLE.to_string(),
        inputs: ToolInputs::BudgetAnalyzer(inputs),
        output,
        view,
    })
}

/// Net savings as a share of income, "N/A" without income.
fn savings_rate(income: f64, net: f64) -> String {
    if income > 0.0 {
        format!("{:.1}%", net / income * 100.0)
    } else {
        "N/A".to_string()
    }
}

pub fn render(inputs: &BudgetInputs, data: &Value) -> PanelView {
    let currency = inputs.currency.as_str();
    let total = inputs.expenses.total();
    let net = inputs.income - total;

    let mut view = PanelView::new(HEADING);
    view.status("Budget Analysis Complete!")
        .metric("Total Income", format_money(currency, inputs.income))
        .metric("Total Expenses", format_money(currency, total))
        .metric_with_delta(
            "Net Savings",
            format_money(currency, net),
            savings_rate(inputs.income, net),
        );

    if !inputs.expenses.is_empty() {
        view.chart(Chart::Pie {
            title: "Expense Breakdown".to_string(),
            slices: inputs
                .expenses
                .items()
                .iter()
                .map(|item| Slice {
                    label: item.category.clone(),
                    value: item.amount,
                })
                .collect(),
        });
    }

    view.section(
        "AI Summary & Tips",
        markdown_or(data, "summary_text", "AI summary could not be generated."),
    )
    .tags("Top Categories", string_list(data, "top_categories"));

    if !inputs.ignored.is_empty() {
        view.warn(format!(
            "The following expenses were ignored due to incorrect formatting: `{}`",
            inputs.ignored.join(", ")
        ));
    }

    view.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fenced, toolkit};
    use serde_json::json;

    fn request(income: f64, expenses: &str) -> BudgetRequest {
        BudgetRequest {
            income,
            expenses: expenses.to_string(),
            currency: "₹".to_string(),
        }
    }

    #[test]
    fn test_validation() {
        assert!(request(0.0, "Rent: 100").validate().is_err());
        assert!(request(-5.0, "Rent: 100").validate().is_err());
        assert!(request(50000.0, "   ").validate().is_err());
        assert!(request(50000.0, "Rent 100, Food").validate().is_err());

        let inputs = request(50000.0, "Rent: 15000, Groceries, Food: 2000").validate().unwrap();
        assert_eq!(inputs.expenses.len(), 2);
        assert_eq!(inputs.ignored, vec!["Groceries"]);
    }

    #[tokio::test]
    async fn test_run_renders_metrics() {
        let reply = fenced(
            r####"{"summary_text": "### AI Summary & Tips\nHealthy budget.", "top_categories": ["Rent", "Groceries"]}"####,
        );
        let (toolkit, generator) = toolkit(&[reply.as_str()], 1.0);

        let outcome = run(&toolkit, request(50000.0, "Rent: 15000, Groceries: 8000"))
            .await
            .unwrap();

        assert_eq!(outcome.title, "Budget Analysis");
        assert!(generator.prompts()[0].contains("- Total Monthly Expenses: ₹23,000.00"));

        let view = &outcome.view;
        let values: Vec<&str> = view.metrics.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["₹50,000.00", "₹23,000.00", "₹27,000.00"]);
        assert_eq!(view.metrics[2].delta.as_deref(), Some("54.0%"));
        assert!(view.sections[0].markdown.contains("Healthy budget."));
        assert_eq!(view.tags[0].tags, vec!["Rent", "Groceries"]);
        match &view.charts[0] {
            Chart::Pie { slices, .. } => assert_eq!(slices.len(), 2),
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_render_fallbacks() {
        let inputs = request(1000.0, "Rent: 1200, oops").validate().unwrap();
        let view = render(&inputs, &json!({}));

        assert_eq!(view.metrics[2].value, "₹-200.00");
        assert_eq!(view.metrics[2].delta.as_deref(), Some("-20.0%"));
        assert_eq!(view.sections[0].markdown, "AI summary could not be generated.");
        assert!(view.tags.is_empty());
        assert!(view.warnings[0].contains("`oops`"));
    }

    #[test]
    fn test_inputs_back_to_form() {
        let inputs = request(50000.0, "Rent: 15000, Groceries: 8000").validate().unwrap();
        assert_eq!(inputs.to_request(), request(50000.0, "Rent: 15000, Groceries: 8000"));
        assert_eq!(savings_rate(0.0, 10.0), "N/A");
    }
}
