//! Prompt builders
//!
//! Plain formatted strings, one per tool, each asking the model for a fixed
//! JSON shape that the matching panel knows how to render.

use crate::format::{capitalize, format_money};
use crate::parsing::{ExpenseSheet, Goal};
use chrono::NaiveDate;

fn expense_lines(expenses: &ExpenseSheet, currency: &str) -> String {
    expenses
        .items()
        .iter()
        .map(|item| format!("- {}: {}{}", capitalize(&item.category), currency, item.amount))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn currency_prompt(
    from: &str,
    to: &str,
    amount: f64,
    real_time_rate: f64,
    lookup_date: Option<NaiveDate>,
) -> String {
    let date_part = lookup_date
        .map(|d| {
            format!(
                "Provide the exchange rate and converted amount for the specific historical date: {}. \
                 This should be in a JSON object with the key 'historical_rate'.",
                d.format("%Y-%m-%d")
            )
        })
        .unwrap_or_default();

    format!(
        r#"You are an expert currency and financial data analyst. Your primary task is to provide currency data in a specific, strict JSON format.

- **Task 1: Real-Time Conversion.** Given the current exchange rate from {from} to {to} is {rate}, calculate the total for {amount} {from}.
- **Task 2: Historical Trend.** Provide a list of the daily exchange rates for {from} to {to} for the last 30 days (ending yesterday). Each item in the list must be an object with 'date' and 'rate' keys.
- **Task 3: Specific Date (if requested).** {date_part}

Your ENTIRE response MUST be a single, clean JSON object with NO additional text or markdown outside of the JSON block. Do not include any explanatory text before or after the JSON.

The JSON must contain the following keys, and their values must match the specified structure:
- "real_time": {{ "rate": <number>, "converted_amount": <number>, "explanation": "<string>" }}
- "historical_trend": [ {{ "date": "<YYYY-MM-DD>", "rate": <number> }}, ... ]
- "historical_rate": {{ "date": "<YYYY-MM-DD>", "rate": <number>, "converted_amount": <number>, "explanation": "<string>" }} (this key is only required if a specific historical date was requested).

Here is a detailed example of the expected format:
```json
{{
  "real_time": {{
    "rate": 1.2345,
    "converted_amount": 123.45,
    "explanation": "The real-time conversion from USD to EUR."
  }},
  "historical_trend": [
    {{ "date": "2023-01-01", "rate": 1.2500 }},
    {{ "date": "2023-01-02", "rate": 1.2480 }}
  ],
  "historical_rate": {{
    "date": "2023-01-01",
    "rate": 1.2500,
    "converted_amount": 125.00,
    "explanation": "The historical conversion from USD to EUR on 2023-01-01."
  }}
}}
```

Generate the JSON for this request: From {from}, To {to}, Amount {amount}.
JSON Output:
"#,
        from = from,
        to = to,
        rate = real_time_rate,
        amount = amount,
        date_part = date_part,
    )
}

pub fn budget_summary_prompt(income: f64, expenses: &ExpenseSheet, currency: &str) -> String {
    let total = expenses.total();
    format!(
        r####"You are LefiBot, a professional financial assistant. Analyze the budget and provide a concise summary.
Budget:
- Monthly Income: {income}
- Expenses:
{details}
- Total Monthly Expenses: {total}
- Net Income: {net}

Respond in a clean JSON format with two keys: "summary_text" and "top_categories".
- "summary_text": A markdown-formatted string with a heading "### AI Summary & Tips" containing:
    1. A sentence on overall financial health.
    2. One practical tip for improvement.
- "top_categories": A list of the top 2-3 spending categories as strings.

JSON Output:
"####,
        income = format_money(currency, income),
        details = expense_lines(expenses, currency),
        total = format_money(currency, total),
        net = format_money(currency, income - total),
    )
}

pub fn chatbot_prompt(user_query: &str) -> String {
    format!(
        r#"You are LefiBot, a helpful and professional financial assistant. Answer the user's personal finance question clearly, concisely, and in a friendly manner.
User's Question: "{}"
"#,
        user_query
    )
}

pub fn nlu_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text for advanced Natural Language Understanding insights.
Provide the output in a clean JSON format with the following keys:
- 'sentiment': A string ('positive', 'negative', or 'neutral').
- 'sentiment_score': A float between -1.0 (very negative) and 1.0 (very positive).
- 'emotion': A single dominant emotion detected in the text (e.g., 'stress', 'joy', 'concern', 'optimism').
- 'intent': The user's primary goal (e.g., 'seeking advice', 'expressing frustration', 'querying data', 'budget_analysis', 'investment_planning').
- 'summary': A concise, one-sentence summary of the text.
- 'keywords': A list of up to 5 most important keywords.
- 'entities': A list of named entities.

Text to analyze: "{}"
JSON Output:
"#,
        text
    )
}

pub fn expense_extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract financial expense data from the following text and return it as a JSON object.
The keys should be the expense categories (e.g., "rent", "groceries", "transport") and the values should be the numerical amounts.
If multiple amounts are found for the same category, sum them up.

Example:
Text: "My rent is 15000, and I spend 8000 on groceries."
Output: {{ "Rent": 15000, "Groceries": 8000 }}

Text: "{}"
JSON Output:
"#,
        text
    )
}

pub fn spending_insight_prompt(
    income: f64,
    expenses: &ExpenseSheet,
    goals: &[Goal],
    currency: &str,
) -> String {
    let goal_details = if goals.is_empty() {
        "No specific goals provided.".to_string()
    } else {
        goals
            .iter()
            .map(|g| {
                format!(
                    "- {}: {}{} (Deadline: {} months)",
                    g.name, currency, g.cost, g.deadline_months
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let surplus = income - expenses.total();

    format!(
        r#"Perform a deep financial analysis based on the data below. Provide structured, actionable insights.

User Financial Profile:
- Monthly Income: {currency}{income}
- Monthly Expenses:
{details}
- Future Goals:
{goal_details}
- Calculated Monthly Surplus (after expenses): {currency}{surplus}

Generate a detailed report in a clean JSON format with the following keys:
- "executive_summary": A concise markdown paragraph summarizing their financial health.
- "spending_breakdown": A markdown string categorizing expenses into Fixed vs. Variable.
- "needs_vs_wants": A markdown string classifying expenses into Needs vs. Wants.
- "red_flags": A markdown string identifying potential budgetary risks.
- "goal_feasibility": A markdown string analyzing if goals are on track.
- "recommendations": A markdown string with the top 3 actionable recommendations.

JSON Output:
"#,
        currency = currency,
        income = income,
        details = expense_lines(expenses, currency),
        goal_details = goal_details,
        surplus = surplus,
    )
}

pub fn investment_prompt(
    current_savings: f64,
    monthly_investment: f64,
    years_to_goal: u32,
    risk_tolerance: &str,
    currency: &str,
) -> String {
    format!(
        r#"You are a Certified Financial Planner (CFP) AI. Based on the user's data, generate a comprehensive investment plan.
User's Financial Profile:
- Current Savings: {savings}
- Monthly Investment: {monthly}
- Years to Investment Goal: {years} years
- Risk Tolerance: {risk}

Provide the response in a single, structured JSON format with the following keys:
- "summary": A markdown-formatted paragraph providing a high-level overview of the plan.
- "portfolio_breakdown": A list of JSON objects, each with 'asset' (e.g., "Stocks", "Bonds", "Crypto") and 'percentage'.
- "projected_growth": A list of JSON objects representing a hypothetical growth path, each with 'year' and 'value'. The projection should be conservative, assuming a realistic average annual return for the given risk tolerance. Include a comment in your JSON about the assumed annual return rate.
- "action_plan": A markdown-formatted list of 3-5 actionable steps the user should take.

JSON Output:
"#,
        savings = format_money(currency, current_savings),
        monthly = format_money(currency, monthly_investment),
        years = years_to_goal,
        risk = risk_tolerance,
    )
}
