//! Per-process session state
//!
//! Two ordered session maps (chats and tool runs), the active pointer into
//! each, and the navigation selection. Nothing is persisted: everything is
//! lost when the process exits.

pub mod records;

pub use records::{ChatMessage, ChatRole, ChatSession, SessionSummary, ToolSession};

use crate::error::AssistantError;
use crate::format::truncate_title;
use crate::tools::{ToolInputs, ToolKind};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

pub const GREETING: &str = "Hello! I'm LefiBot. How can I help with your finances today? \
I can help you with anything from budgeting to investment planning.";
pub const NEW_CHAT_TITLE: &str = "New Chat";
pub const CHAT_TITLE_MAX_CHARS: usize = 40;
pub const RECENT_CHAT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Chat,
    Tools,
}

/// Sidebar / navigation snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Navigation {
    pub view: View,
    pub active_tool: ToolKind,
    pub current_chat_id: Option<String>,
    pub current_tool_id: Option<String>,
    pub recent_chats: Vec<SessionSummary>,
    pub recent_tool_sessions: Vec<SessionSummary>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    chat_sessions: Vec<ChatSession>,
    current_chat_id: Option<String>,
    tool_sessions: Vec<ToolSession>,
    current_tool_id: Option<String>,
    view: View,
    active_tool: ToolKind,
    budget_prefill: Option<String>,
    last_stamp_micros: i64,
}

impl SessionState {
    /// Fresh state with one greeted chat session.
    pub fn new() -> Self {
        let mut state = Self::default();
        state.start_chat();
        state
    }

    /// `<prefix>_<secs>.<micros>`, strictly increasing within this state.
    fn next_id(&mut self, prefix: &str) -> String {
        let now = Utc::now().timestamp_micros();
        let stamp = now.max(self.last_stamp_micros + 1);
        self.last_stamp_micros = stamp;
        format!(
            "{}_{}.{:06}",
            prefix,
            stamp.div_euclid(1_000_000),
            stamp.rem_euclid(1_000_000)
        )
    }

    fn start_chat(&mut self) -> String {
        let id = self.next_id("chat");
        let mut session = ChatSession::new(id.clone(), NEW_CHAT_TITLE);
        session.push(ChatMessage::assistant(GREETING));
        self.chat_sessions.push(session);
        self.current_chat_id = Some(id.clone());
        debug!(chat_id = %id, "Started chat session");
        id
    }

    // =============================
    // Chat sessions
    // =============================

    pub fn chat_sessions(&self) -> &[ChatSession] {
        &self.chat_sessions
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.current_chat_id.as_deref()
    }

    pub fn chat(&self, id: &str) -> Option<&ChatSession> {
        self.chat_sessions.iter().find(|s| s.id == id)
    }

    fn chat_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.chat_sessions.iter_mut().find(|s| s.id == id)
    }

    /// The active chat, created (with greeting) if the pointer is dangling.
    pub fn ensure_active_chat(&mut self) -> &ChatSession {
        let id = match self.current_chat_id.clone() {
            Some(id) if self.chat(&id).is_some() => id,
            _ => self.start_chat(),
        };
        let index = self
            .chat_sessions
            .iter()
            .position(|s| s.id == id)
            .unwrap_or(self.chat_sessions.len() - 1);
        &self.chat_sessions[index]
    }

    /// Append a user turn to the active chat and return the chat id.
    pub fn append_user_message(&mut self, content: &str) -> String {
        let id = self.ensure_active_chat().id.clone();
        if let Some(session) = self.chat_mut(&id) {
            if session.title == NEW_CHAT_TITLE {
                session.title = truncate_title(content, CHAT_TITLE_MAX_CHARS);
            }
            session.push(ChatMessage::user(content));
        }
        id
    }

    pub fn append_assistant_message(&mut self, chat_id: &str, content: &str) -> Result<()> {
        let session = self
            .chat_mut(chat_id)
            .ok_or_else(|| AssistantError::SessionNotFound(chat_id.to_string()))?;
        session.push(ChatMessage::assistant(content));
        Ok(())
    }

    pub fn select_chat(&mut self, id: &str) -> Result<&ChatSession> {
        if self.chat(id).is_none() {
            return Err(AssistantError::SessionNotFound(id.to_string()));
        }
        self.current_chat_id = Some(id.to_string());
        self.view = View::Chat;
        self.chat(id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))
    }

    /// Remove a chat; if it was active, fall back to the newest remaining
    /// chat or a fresh greeted one.
    pub fn delete_chat(&mut self, id: &str) -> Result<()> {
        let before = self.chat_sessions.len();
        self.chat_sessions.retain(|s| s.id != id);
        if self.chat_sessions.len() == before {
            return Err(AssistantError::SessionNotFound(id.to_string()));
        }

        if self.current_chat_id.as_deref() == Some(id) {
            self.current_chat_id = self.chat_sessions.last().map(|s| s.id.clone());
            if self.current_chat_id.is_none() {
                self.start_chat();
            }
        }
        info!(chat_id = %id, "Deleted chat session");
        Ok(())
    }

    /// Drop every chat and start over with a single greeted session.
    pub fn clear_chat_history(&mut self) -> &ChatSession {
        self.chat_sessions.clear();
        self.current_chat_id = None;
        self.start_chat();
        info!("Cleared chat history");
        self.ensure_active_chat()
    }

    /// Up to the last `RECENT_CHAT_LIMIT` chats, oldest first.
    pub fn recent_chats(&self) -> Vec<SessionSummary> {
        let skip = self.chat_sessions.len().saturating_sub(RECENT_CHAT_LIMIT);
        self.chat_sessions
            .iter()
            .skip(skip)
            .map(|s| SessionSummary {
                id: s.id.clone(),
                title: s.title.clone(),
                kind: None,
                active: self.current_chat_id.as_deref() == Some(s.id.as_str()),
            })
            .collect()
    }

    // =============================
    // Tool sessions
    // =============================

    pub fn tool_sessions(&self) -> &[ToolSession] {
        &self.tool_sessions
    }

    pub fn current_tool_id(&self) -> Option<&str> {
        self.current_tool_id.as_deref()
    }

    pub fn tool_session(&self, id: &str) -> Option<&ToolSession> {
        self.tool_sessions.iter().find(|s| s.id == id)
    }

    pub fn active_tool_session(&self) -> Option<&ToolSession> {
        self.current_tool_id
            .as_deref()
            .and_then(|id| self.tool_session(id))
    }

    /// Store a successful tool run and make it the active one.
    pub fn record_tool_session(
        &mut self,
        title: String,
        inputs: ToolInputs,
        output: Option<Value>,
    ) -> String {
        let id = self.next_id("tool");
        let kind = inputs.kind();
        self.tool_sessions.push(ToolSession {
            id: id.clone(),
            title,
            kind,
            inputs,
            output,
            created_at: Utc::now(),
        });
        self.current_tool_id = Some(id.clone());
        self.active_tool = kind;
        self.view = View::Tools;
        info!(tool_id = %id, tool = kind.slug(), "Recorded tool session");
        id
    }

    pub fn select_tool_session(&mut self, id: &str) -> Result<&ToolSession> {
        let kind = self
            .tool_session(id)
            .map(|s| s.kind)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))?;
        self.current_tool_id = Some(id.to_string());
        self.view = View::Tools;
        self.active_tool = kind;
        self.tool_session(id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))
    }

    /// Remove a tool session; an active pointer at it moves to the newest
    /// remaining session, or becomes empty.
    pub fn delete_tool_session(&mut self, id: &str) -> Result<()> {
        let before = self.tool_sessions.len();
        self.tool_sessions.retain(|s| s.id != id);
        if self.tool_sessions.len() == before {
            return Err(AssistantError::SessionNotFound(id.to_string()));
        }

        if self.current_tool_id.as_deref() == Some(id) {
            self.current_tool_id = self.tool_sessions.last().map(|s| s.id.clone());
        }
        info!(tool_id = %id, "Deleted tool session");
        Ok(())
    }

    pub fn clear_tool_history(&mut self) {
        self.tool_sessions.clear();
        self.current_tool_id = None;
        info!("Cleared tool history");
    }

    /// All tool sessions, newest first.
    pub fn recent_tool_sessions(&self) -> Vec<SessionSummary> {
        self.tool_sessions
            .iter()
            .rev()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                title: s.title.clone(),
                kind: Some(s.kind),
                active: self.current_tool_id.as_deref() == Some(s.id.as_str()),
            })
            .collect()
    }

    // =============================
    // Navigation
    // =============================

    pub fn view(&self) -> View {
        self.view
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    /// Switch view and, optionally, the selected tool panel.
    pub fn navigate(&mut self, view: View, tool: Option<ToolKind>) {
        self.view = view;
        if let Some(tool) = tool {
            if tool != self.active_tool {
                self.current_tool_id = None;
            }
            self.active_tool = tool;
        }
    }

    /// Follow a chat redirect: open the tool with an empty form.
    pub fn accept_redirect(&mut self, tool: ToolKind) {
        self.view = View::Tools;
        self.active_tool = tool;
        self.current_tool_id = None;
    }

    pub fn set_budget_prefill(&mut self, expenses: String) {
        self.budget_prefill = Some(expenses);
    }

    pub fn budget_prefill(&self) -> Option<&str> {
        self.budget_prefill.as_deref()
    }

    /// Prefilled expenses are shown once, then forgotten.
    pub fn take_budget_prefill(&mut self) -> Option<String> {
        self.budget_prefill.take()
    }

    pub fn navigation(&self) -> Navigation {
        Navigation {
            view: self.view,
            active_tool: self.active_tool,
            current_chat_id: self.current_chat_id.clone(),
            current_tool_id: self.current_tool_id.clone(),
            recent_chats: self.recent_chats(),
            recent_tool_sessions: self.recent_tool_sessions(),
        }
    }
}
