//! Render-ready panel views
//!
//! Panels don't draw anything themselves; they describe metrics, charts,
//! markdown sections and notices that the front end lays out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Chart {
    Pie {
        title: String,
        slices: Vec<Slice>,
    },
    Line {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<Point>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagGroup {
    pub title: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub label: String,
    /// 0..=100
    pub percent: u8,
    pub note: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelView {
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub metrics: Vec<Metric>,
    pub charts: Vec<Chart>,
    pub sections: Vec<Section>,
    pub tags: Vec<TagGroup>,
    pub progress: Vec<Progress>,
    pub warnings: Vec<String>,
}

impl PanelView {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            ..Self::default()
        }
    }

    pub fn status(&mut self, message: impl Into<String>) -> &mut Self {
        self.status = Some(message.into());
        self
    }

    pub fn metric(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metrics.push(Metric {
            label: label.into(),
            value: value.into(),
            delta: None,
        });
        self
    }

    pub fn metric_with_delta(
        &mut self,
        label: impl Into<String>,
        value: impl Into<String>,
        delta: impl Into<String>,
    ) -> &mut Self {
        self.metrics.push(Metric {
            label: label.into(),
            value: value.into(),
            delta: Some(delta.into()),
        });
        self
    }

    pub fn chart(&mut self, chart: Chart) -> &mut Self {
        self.charts.push(chart);
        self
    }

    pub fn section(&mut self, title: impl Into<String>, markdown: impl Into<String>) -> &mut Self {
        self.sections.push(Section {
            title: title.into(),
            markdown: markdown.into(),
        });
        self
    }

    pub fn tags(&mut self, title: impl Into<String>, tags: Vec<String>) -> &mut Self {
        if !tags.is_empty() {
            self.tags.push(TagGroup {
                title: title.into(),
                tags,
            });
        }
        self
    }

    pub fn progress(&mut self, progress: Progress) -> &mut Self {
        self.progress.push(progress);
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}

// ---- defensive accessors over model output ----

/// Field that is present and not empty, null, false or zero.
pub fn present<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    })
}

/// String field, or `fallback` when missing / not a string.
pub fn text_or(data: &Value, key: &str, fallback: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

/// Markdown field; a list of strings becomes a bullet list.
pub fn markdown_or(data: &Value, key: &str, fallback: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Array(_)) => {
            let items = string_list(data, key);
            if items.is_empty() {
                fallback.to_string()
            } else {
                items
                    .iter()
                    .map(|item| format!("- {}", item))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        _ => fallback.to_string(),
    }
}

/// Numeric field; numeric strings are accepted too.
pub fn number(data: &Value, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Array of scalars rendered as strings.
pub fn string_list(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Scalar rendered as a label ("2030", "Stocks").
pub fn label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
