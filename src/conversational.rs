//! Conversational interaction handler
//!
//! One chat turn: record the user message, classify it, and either suggest a
//! tool panel or answer in the chat. Classification is best effort: when it
//! fails the turn is answered normally.
//!
//! The session lock is never held across a model call.

use crate::classifier::{InteractionClassifier, InteractionType};
use crate::error::AssistantError;
use crate::extract::extract_json;
use crate::llm::LlmClient;
use crate::prompts::{chatbot_prompt, expense_extraction_prompt, nlu_prompt};
use crate::render::label;
use crate::state::{ChatSession, SessionState};
use crate::tools::ToolKind;
use crate::Result;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Budget form prefill when no expenses could be pulled from the message.
pub const FALLBACK_BUDGET_PREFILL: &str = "Rent: 0, Groceries: 0";
const PREFILL_WARNING: &str = "Could not extract specific numbers, but I can still redirect you.";

/// Suggestion to continue in a tool panel instead of the chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectSuggestion {
    pub tool: ToolKind,
    pub messages: Vec<String>,
    pub action_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatTurnOutcome {
    Reply { content: String },
    Redirect(RedirectSuggestion),
}

/// Result of a turn as seen by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub chat_id: String,
    pub outcome: ChatTurnOutcome,
    pub session: ChatSession,
}

#[derive(Clone)]
pub struct ChatAssistant {
    llm: LlmClient,
}

impl ChatAssistant {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Classify via the NLU prompt; any failure means "no redirect".
    pub async fn classify(&self, text: &str) -> InteractionType {
        let raw = match self.llm.complete(&nlu_prompt(text)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Intent classification failed, answering normally: {}", e);
                return InteractionType::Conversational;
            }
        };

        match extract_json(&raw).value() {
            Some(data) => InteractionClassifier::classify_value(data),
            None => {
                warn!("Intent classification returned no usable JSON, answering normally");
                InteractionType::Conversational
            }
        }
    }

    /// "Rent: 15000, Groceries: 8000" from the expenses mentioned in `text`.
    pub async fn extract_expense_prefill(&self, text: &str) -> Result<String> {
        let raw = self.llm.complete(&expense_extraction_prompt(text)).await?;
        let data = extract_json(&raw).into_value(&raw)?;

        let pairs: Vec<String> = data
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(key, value)| Some(format!("{}: {}", key, label(value)?)))
                    .collect()
            })
            .unwrap_or_default();

        if pairs.is_empty() {
            return Err(AssistantError::MalformedModelOutput {
                reason: "no expenses found in the AI response".to_string(),
                raw,
            });
        }
        Ok(pairs.join(", "))
    }

    async fn budget_redirect(&self, text: &str) -> RedirectSuggestion {
        let (prefill, warning) = match self.extract_expense_prefill(text).await {
            Ok(prefill) => (prefill, None),
            Err(e) => {
                warn!("Expense extraction for redirect failed: {}", e);
                (
                    FALLBACK_BUDGET_PREFILL.to_string(),
                    Some(PREFILL_WARNING.to_string()),
                )
            }
        };

        RedirectSuggestion {
            tool: ToolKind::BudgetAnalyzer,
            messages: vec![
                "It sounds like you're concerned about your finances. I can help with that!"
                    .to_string(),
                "Would you like to analyze your spending with our **Budget Analyzer** tool? \
                 We can get started right away."
                    .to_string(),
            ],
            action_label: "Go to Budget Analyzer".to_string(),
            prefill: Some(prefill),
            warning,
        }
    }

    fn investment_redirect() -> RedirectSuggestion {
        RedirectSuggestion {
            tool: ToolKind::InvestmentPlanner,
            messages: vec![
                "That's a great question! I can help you with investment planning.".to_string(),
                "Would you like to use our **AI Investment Planner** tool?".to_string(),
            ],
            action_label: "Go to Investment Planner".to_string(),
            prefill: None,
            warning: None,
        }
    }

    /// Chat answer; a failure becomes an apology rather than an error.
    pub async fn reply(&self, text: &str) -> String {
        match self.llm.complete(&chatbot_prompt(text)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Chat reply failed: {}", e);
                format!("Sorry, I encountered an error: {}", e)
            }
        }
    }

    /// Decide the outcome of a turn; touches no session state.
    pub async fn process(&self, text: &str) -> ChatTurnOutcome {
        match self.classify(text).await {
            InteractionType::Redirect(ToolKind::BudgetAnalyzer) => {
                ChatTurnOutcome::Redirect(self.budget_redirect(text).await)
            }
            InteractionType::Redirect(ToolKind::InvestmentPlanner) => {
                ChatTurnOutcome::Redirect(Self::investment_redirect())
            }
            InteractionType::Redirect(_) | InteractionType::Conversational => {
                ChatTurnOutcome::Reply {
                    content: self.reply(text).await,
                }
            }
        }
    }
}

/// Record the outcome: a reply is appended, a redirect appends nothing but
/// may leave a budget prefill behind.
pub fn apply_turn(
    state: &mut SessionState,
    chat_id: &str,
    outcome: &ChatTurnOutcome,
) -> Result<()> {
    match outcome {
        ChatTurnOutcome::Reply { content } => state.append_assistant_message(chat_id, content),
        ChatTurnOutcome::Redirect(suggestion) => {
            if let Some(prefill) = &suggestion.prefill {
                state.set_budget_prefill(prefill.clone());
            }
            Ok(())
        }
    }
}

/// Run one chat turn against the shared session.
pub async fn handle_chat_turn(
    assistant: &ChatAssistant,
    session: &RwLock<SessionState>,
    text: &str,
) -> Result<ChatTurn> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AssistantError::Validation("Please enter a message.".to_string()));
    }

    let chat_id = session.write().await.append_user_message(text);
    info!(chat_id = %chat_id, "Processing chat turn");

    let outcome = assistant.process(text).await;

    let mut state = session.write().await;
    apply_turn(&mut state, &chat_id, &outcome)?;
    let chat = state
        .chat(&chat_id)
        .cloned()
        .ok_or_else(|| AssistantError::SessionNotFound(chat_id.clone()))?;

    if let ChatTurnOutcome::Redirect(suggestion) = &outcome {
        info!(chat_id = %chat_id, tool = suggestion.tool.slug(), "Suggesting tool redirect");
    }

    Ok(ChatTurn {
        chat_id,
        outcome,
        session: chat,
    })
}
