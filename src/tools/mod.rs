//! Finance tool panels
//!
//! Every panel runs the same cycle: validate form input, build a prompt,
//! call the model, pull JSON out of the reply, and describe the result as a
//! [`PanelView`]. The currency converter looks up a live rate first.
//! Nothing is stored here; the caller records successful outcomes.

pub mod budget;
pub mod currency;
pub mod insights;
pub mod investment;
pub mod nlu;

use crate::error::AssistantError;
use crate::exchange_rate::RateProvider;
use crate::extract::extract_json;
use crate::llm::LlmClient;
use crate::render::PanelView;
use crate::state::SessionState;
use crate::Result;
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    CurrencyConverter,
    BudgetAnalyzer,
    NluAnalysis,
    SpendingInsights,
    InvestmentPlanner,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::CurrencyConverter,
        ToolKind::BudgetAnalyzer,
        ToolKind::NluAnalysis,
        ToolKind::SpendingInsights,
        ToolKind::InvestmentPlanner,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ToolKind::CurrencyConverter => "currency-converter",
            ToolKind::BudgetAnalyzer => "budget-analyzer",
            ToolKind::NluAnalysis => "nlu-analysis",
            ToolKind::SpendingInsights => "spending-insights",
            ToolKind::InvestmentPlanner => "investment-planner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::CurrencyConverter => "Currency Converter",
            ToolKind::BudgetAnalyzer => "Budget Analyzer",
            ToolKind::NluAnalysis => "NLU Analysis",
            ToolKind::SpendingInsights => "Spending Insights",
            ToolKind::InvestmentPlanner => "Investment Planner",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(slug))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ToolKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slug(s).ok_or_else(|| AssistantError::Validation(format!("Unknown tool: {}", s)))
    }
}

/// Validated inputs of one tool run, tagged by tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "params", rename_all = "kebab-case")]
pub enum ToolInputs {
    CurrencyConverter(currency::ConversionRequest),
    BudgetAnalyzer(budget::BudgetInputs),
    NluAnalysis(nlu::NluRequest),
    SpendingInsights(insights::InsightInputs),
    InvestmentPlanner(investment::PlanRequest),
}

impl ToolInputs {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInputs::CurrencyConverter(_) => ToolKind::CurrencyConverter,
            ToolInputs::BudgetAnalyzer(_) => ToolKind::BudgetAnalyzer,
            ToolInputs::NluAnalysis(_) => ToolKind::NluAnalysis,
            ToolInputs::SpendingInsights(_) => ToolKind::SpendingInsights,
            ToolInputs::InvestmentPlanner(_) => ToolKind::InvestmentPlanner,
        }
    }

    /// The form values that would reproduce this run.
    fn form_values(&self) -> Result<Value> {
        let values = match self {
            ToolInputs::CurrencyConverter(inputs) => serde_json::to_value(inputs)?,
            ToolInputs::BudgetAnalyzer(inputs) => serde_json::to_value(inputs.to_request())?,
            ToolInputs::NluAnalysis(inputs) => serde_json::to_value(inputs)?,
            ToolInputs::SpendingInsights(inputs) => serde_json::to_value(inputs.to_request())?,
            ToolInputs::InvestmentPlanner(inputs) => serde_json::to_value(inputs)?,
        };
        Ok(values)
    }
}

/// A successful tool run, ready to be recorded and shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub title: String,
    pub inputs: ToolInputs,
    pub output: Value,
    pub view: PanelView,
}

/// Form model for a panel: field values plus the active run's view, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolForm {
    pub tool: ToolKind,
    pub label: &'static str,
    pub values: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<PanelView>,
}

#[derive(Clone)]
pub struct FinanceToolkit {
    llm: LlmClient,
    rates: Arc<dyn RateProvider>,
}

impl FinanceToolkit {
    pub fn new(llm: LlmClient, rates: Arc<dyn RateProvider>) -> Self {
        Self { llm, rates }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    pub fn rates(&self) -> &dyn RateProvider {
        self.rates.as_ref()
    }

    /// Validate `body` as the panel's form and run the panel.
    pub async fn run(&self, kind: ToolKind, body: Value) -> Result<ToolOutcome> {
        info!(tool = kind.slug(), "Running tool");

        let result = match kind {
            ToolKind::CurrencyConverter => {
                currency::run(self, parse_body(body)?, today()).await
            }
            ToolKind::BudgetAnalyzer => budget::run(self, parse_body(body)?).await,
            ToolKind::NluAnalysis => nlu::run(self, parse_body(body)?).await,
            ToolKind::SpendingInsights => insights::run(self, parse_body(body)?).await,
            ToolKind::InvestmentPlanner => investment::run(self, parse_body(body)?).await,
        };

        match &result {
            Ok(outcome) => info!(tool = kind.slug(), title = %outcome.title, "Tool run complete"),
            Err(e) => warn!(tool = kind.slug(), "Tool run failed: {}", e),
        }
        result
    }

    /// Prompt the model and decode the JSON object in its reply.
    pub async fn generate_json(&self, prompt: &str) -> Result<Value> {
        let raw = self.llm.complete(prompt).await?;
        extract_json(&raw).into_value(&raw).map_err(|e| {
            warn!("Model reply did not contain usable JSON: {}", e);
            e
        })
    }
}

/// Deserialize a form body; shape errors are the user's to fix.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T> {
    let body = if body.is_null() {
        Value::Object(Default::default())
    } else {
        body
    };
    serde_json::from_value(body)
        .map_err(|e| AssistantError::Validation(format!("Invalid tool input: {}", e)))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Re-render a stored run.
pub fn render_session(inputs: &ToolInputs, output: Option<&Value>) -> PanelView {
    let empty = Value::Null;
    let output = output.unwrap_or(&empty);
    match inputs {
        ToolInputs::CurrencyConverter(inputs) => currency::render(inputs, output),
        ToolInputs::BudgetAnalyzer(inputs) => budget::render(inputs, output),
        ToolInputs::NluAnalysis(inputs) => nlu::render(inputs, output),
        ToolInputs::SpendingInsights(inputs) => insights::render(inputs, output),
        ToolInputs::InvestmentPlanner(inputs) => investment::render(inputs, output),
    }
}

/// Form for `kind`: the active run's inputs when it belongs to this panel,
/// otherwise the panel defaults. A pending budget prefill is used once.
pub fn form(kind: ToolKind, state: &mut SessionState) -> Result<ToolForm> {
    let active = state
        .active_tool_session()
        .filter(|session| session.kind == kind)
        .map(|session| {
            (
                session.id.clone(),
                session.inputs.clone(),
                render_session(&session.inputs, session.output.as_ref()),
            )
        });

    let (mut values, session_id, view) = match active {
        Some((id, inputs, view)) => (inputs.form_values()?, Some(id), Some(view)),
        None => (default_form(kind, today())?, None, None),
    };

    if kind == ToolKind::BudgetAnalyzer {
        if let Some(expenses) = state.take_budget_prefill() {
            values["expenses"] = Value::String(expenses);
        }
    }

    Ok(ToolForm {
        tool: kind,
        label: kind.label(),
        values,
        session_id,
        view,
    })
}

fn default_form(kind: ToolKind, today: NaiveDate) -> Result<Value> {
    let values = match kind {
        ToolKind::CurrencyConverter => {
            serde_json::to_value(currency::ConversionRequest::form_default(today))?
        }
        ToolKind::BudgetAnalyzer => serde_json::to_value(budget::BudgetRequest::default())?,
        ToolKind::NluAnalysis => serde_json::to_value(nlu::NluRequest::default())?,
        ToolKind::SpendingInsights => serde_json::to_value(insights::InsightRequest::default())?,
        ToolKind::InvestmentPlanner => serde_json::to_value(investment::PlanRequest::default())?,
    };
    Ok(values)
}
