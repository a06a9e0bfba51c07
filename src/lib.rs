//! LefiBot personal-finance assistant
//!
//! A chat assistant plus five finance tool panels, served over HTTP:
//! - Currency converter (live exchange rate + model-generated trend)
//! - Budget analyzer
//! - NLU analysis
//! - Spending insights with goal tracking
//! - Investment planner
//!
//! TOOL CYCLE:
//! INPUT → VALIDATE → PROMPT → LLM → EXTRACT JSON → RENDER → RECORD

pub mod api;
pub mod classifier;
pub mod config;
pub mod conversational;
pub mod currency;
pub mod error;
pub mod exchange_rate;
pub mod extract;
pub mod format;
pub mod gemini;
pub mod llm;
pub mod parsing;
pub mod prompts;
pub mod render;
pub mod state;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use classifier::{InteractionClassifier, InteractionType};
pub use config::AppConfig;
pub use error::AssistantError;
pub use state::SessionState;
pub use tools::{FinanceToolkit, ToolKind};
