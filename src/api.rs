//! REST API Server for LefiBot
//!
//! Exposes the chat, the tool panels and the session sidebar over HTTP.
//! Panels come back as render-ready views; the front end only lays them out.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::conversational::{handle_chat_turn, ChatAssistant};
use crate::currency;
use crate::error::AssistantError;
use crate::state::{SessionState, View};
use crate::tools::{self, FinanceToolkit, ToolKind};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub view: View,
    #[serde(default)]
    pub tool: Option<ToolKind>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RedirectRequest {
    pub tool: ToolKind,
}

#[derive(Debug, Serialize)]
struct CurrencyOption {
    code: &'static str,
    name: &'static str,
    label: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Error carrying diagnostics, e.g. the raw model reply.
    pub fn error_with_data(message: String, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::error(message)
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn failure(error: AssistantError) -> ApiResult {
    let status = error.status_code();
    let response = match error.raw_output() {
        Some(raw) => ApiResponse::error_with_data(error.to_string(), json!({ "raw_output": raw })),
        None => ApiResponse::error(error.to_string()),
    };
    (status, Json(response))
}

fn respond<T: Serialize>(result: crate::Result<T>) -> ApiResult {
    result.map(ok).unwrap_or_else(failure)
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub toolkit: FinanceToolkit,
    pub chat: ChatAssistant,
    pub session: Arc<RwLock<SessionState>>,
}

impl ApiState {
    pub fn new(toolkit: FinanceToolkit, chat: ChatAssistant) -> Self {
        Self {
            toolkit,
            chat,
            session: Arc::new(RwLock::new(SessionState::new())),
        }
    }
}

/// =============================
/// Health & Reference Data
/// =============================

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_currencies() -> ApiResult {
    let options: Vec<CurrencyOption> = currency::all()
        .iter()
        .map(|&(code, name)| CurrencyOption {
            code,
            name,
            label: currency::format_label(code),
        })
        .collect();
    ok(options)
}

/// =============================
/// Navigation
/// =============================

async fn get_navigation(State(state): State<ApiState>) -> ApiResult {
    ok(state.session.read().await.navigation())
}

async fn navigate(State(state): State<ApiState>, Json(req): Json<NavigateRequest>) -> ApiResult {
    let mut session = state.session.write().await;
    session.navigate(req.view, req.tool);
    ok(session.navigation())
}

/// =============================
/// Tool Panels
/// =============================

async fn tool_form(State(state): State<ApiState>, Path(tool): Path<String>) -> ApiResult {
    let kind = match tool.parse::<ToolKind>() {
        Ok(kind) => kind,
        Err(e) => return failure(e),
    };
    let mut session = state.session.write().await;
    respond(tools::form(kind, &mut session))
}

async fn run_tool(
    State(state): State<ApiState>,
    Path(tool): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let kind = match tool.parse::<ToolKind>() {
        Ok(kind) => kind,
        Err(e) => return failure(e),
    };
    info!("Received tool request: {}", kind.slug());

    // the model call runs without the session lock
    let outcome = match state.toolkit.run(kind, body).await {
        Ok(outcome) => outcome,
        Err(e) => return failure(e),
    };

    let session_id = state.session.write().await.record_tool_session(
        outcome.title.clone(),
        outcome.inputs.clone(),
        Some(outcome.output.clone()),
    );

    ok(json!({
        "session_id": session_id,
        "title": outcome.title,
        "tool": kind,
        "inputs": outcome.inputs,
        "output": outcome.output,
        "view": outcome.view,
    }))
}

/// =============================
/// Tool Sessions
/// =============================

async fn list_tool_sessions(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.read().await;
    ok(json!({
        "current_tool_id": session.current_tool_id(),
        "sessions": session.recent_tool_sessions(),
    }))
}

async fn clear_tool_sessions(State(state): State<ApiState>) -> ApiResult {
    let mut session = state.session.write().await;
    session.clear_tool_history();
    ok(session.navigation())
}

async fn get_tool_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.write().await;
    respond(session.select_tool_session(&id).map(|record| {
        json!({
            "session": record,
            "view": tools::render_session(&record.inputs, record.output.as_ref()),
        })
    }))
}

async fn delete_tool_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.write().await;
    match session.delete_tool_session(&id) {
        Ok(()) => ok(session.navigation()),
        Err(e) => failure(e),
    }
}

/// =============================
/// Chat
/// =============================

async fn current_chat(State(state): State<ApiState>) -> ApiResult {
    let mut session = state.session.write().await;
    ok(session.ensure_active_chat().clone())
}

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    respond(handle_chat_turn(&state.chat, &state.session, &req.message).await)
}

async fn accept_redirect(
    State(state): State<ApiState>,
    Json(req): Json<RedirectRequest>,
) -> ApiResult {
    info!("Following chat redirect to {}", req.tool.slug());
    let mut session = state.session.write().await;
    session.accept_redirect(req.tool);
    respond(tools::form(req.tool, &mut session))
}

/// =============================
/// Chat Sessions
/// =============================

async fn list_chat_sessions(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.read().await;
    ok(json!({
        "current_chat_id": session.current_chat_id(),
        "total": session.chat_sessions().len(),
        "recent": session.recent_chats(),
    }))
}

async fn clear_chat_sessions(State(state): State<ApiState>) -> ApiResult {
    let mut session = state.session.write().await;
    ok(session.clear_chat_history().clone())
}

async fn get_chat_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.write().await;
    respond(session.select_chat(&id).cloned())
}

async fn delete_chat_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.write().await;
    match session.delete_chat(&id) {
        Ok(()) => ok(session.navigation()),
        Err(e) => {
            warn!("Chat delete failed: {}", e);
            failure(e)
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/currencies", get(list_currencies))
        .route("/api/navigation", get(get_navigation).post(navigate))
        .route("/api/tools/:tool/form", get(tool_form))
        .route("/api/tools/:tool", post(run_tool))
        .route(
            "/api/tool-sessions",
            get(list_tool_sessions).delete(clear_tool_sessions),
        )
        .route(
            "/api/tool-sessions/:id",
            get(get_tool_session).delete(delete_tool_session),
        )
        .route("/api/chat", get(current_chat).post(chat_handler))
        .route("/api/chat/redirect", post(accept_redirect))
        .route(
            "/api/chat-sessions",
            get(list_chat_sessions).delete(clear_chat_sessions),
        )
        .route(
            "/api/chat-sessions/:id",
            get(get_chat_session).delete(delete_chat_session),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
