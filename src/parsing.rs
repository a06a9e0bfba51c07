//! Parsing of free-text form inputs
//!
//! Expenses: "Rent: 15000, Groceries: 8000"
//! Goals:    "Vacation: 50000 (6 months), New Phone: 80000 (12 months)"
//!
//! Bad fragments are collected instead of failing the whole input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"(\d+)").expect("digit pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub category: String,
    pub amount: f64,
}

/// Insertion-ordered category → amount mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseSheet {
    items: Vec<ExpenseItem>,
}

impl ExpenseSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten category keeps its position.
    pub fn insert(&mut self, category: impl Into<String>, amount: f64) {
        let category = category.into();
        match self.items.iter_mut().find(|i| i.category == category) {
            Some(existing) => existing.amount = amount,
            None => self.items.push(ExpenseItem { category, amount }),
        }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|i| i.category == category)
            .map(|i| i.amount)
    }

    pub fn items(&self) -> &[ExpenseItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.amount).sum()
    }

    /// Back to the form's text representation.
    pub fn to_input_text(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{}: {}", i.category, i.amount))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExpenses {
    pub expenses: ExpenseSheet,
    pub malformed: Vec<String>,
}

pub fn parse_expenses(text: &str) -> ParsedExpenses {
    let mut parsed = ParsedExpenses::default();

    for fragment in text.split(',') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        let Some((name, amount)) = fragment.split_once(':') else {
            parsed.malformed.push(fragment.to_string());
            continue;
        };

        let name = name.trim();
        match amount.trim().parse::<f64>() {
            Ok(amount) if !name.is_empty() && amount.is_finite() => {
                parsed.expenses.insert(name, amount)
            }
            _ => parsed.malformed.push(fragment.to_string()),
        }
    }

    parsed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub cost: f64,
    pub deadline_months: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGoals {
    pub goals: Vec<Goal>,
    pub malformed: Vec<String>,
}

pub fn parse_goals(text: &str) -> ParsedGoals {
    let mut parsed = ParsedGoals::default();
    if text.trim().is_empty() {
        return parsed;
    }

    for fragment in text.split(',') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        match parse_goal(fragment) {
            Some(goal) => parsed.goals.push(goal),
            None => parsed.malformed.push(fragment.to_string()),
        }
    }

    parsed
}

fn parse_goal(fragment: &str) -> Option<Goal> {
    if !(fragment.contains(':') && fragment.contains('(') && fragment.contains(')')) {
        return None;
    }

    let (name, rest) = fragment.split_once(':')?;
    let (cost, deadline) = rest.split_once('(')?;
    let cost = cost.trim().parse::<f64>().ok().filter(|c| c.is_finite())?;
    let deadline_months = FIRST_NUMBER
        .captures(deadline)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())?;

    Some(Goal {
        name: name.trim().to_string(),
        cost,
        deadline_months,
    })
}
