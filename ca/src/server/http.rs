//! Axum routes for the chat API
//!
//! Three endpoints: run a turn, read a transcript, list threads. The agent
//! engine does the actual work; this layer only validates requests and
//! serializes at most one in-flight turn per thread.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatstore::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::agent::AgentEngine;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    engine: Arc<AgentEngine>,
    /// One async mutex per thread id, so turns on the same thread queue up
    turn_locks: Arc<tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    pub fn new(engine: Arc<AgentEngine>) -> Self {
        Self {
            engine,
            turn_locks: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks.entry(thread_id.to_string()).or_default().clone()
    }

    /// Drop the map entry once no turn holds or awaits it, so the lock map
    /// does not grow with every distinct thread id ever served
    async fn release_lock(&self, thread_id: &str) {
        let mut locks = self.turn_locks.lock().await;
        if let Some(entry) = locks.get(thread_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(thread_id);
            }
        }
    }
}

/// API errors, rendered as `{"error": ...}` with a matching status
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    result: String,
}

#[derive(Debug, Serialize)]
struct TranscriptMessage {
    sender: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct TranscriptResponse {
    thread_id: String,
    messages: Vec<TranscriptMessage>,
}

#[derive(Debug, Serialize)]
struct ListingResponse {
    result: Vec<String>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat/listing", get(list_threads))
        .route("/chat/:thread_id", post(run_turn))
        .route("/chat/:thread_id", get(get_transcript))
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: AppState, addr: SocketAddr) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn run_turn(
    State(st): State<AppState>,
    Path(path_thread_id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let thread_id = match body.thread_id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(ApiError::BadRequest("thread_id is required".to_string())),
    };
    let query = match body.query.as_deref() {
        Some(q) if !q.trim().is_empty() => q.to_string(),
        _ => return Err(ApiError::BadRequest("query is required".to_string())),
    };
    if thread_id != path_thread_id {
        return Err(ApiError::BadRequest(
            "thread_id in body does not match the URL".to_string(),
        ));
    }

    let lock = st.lock_for(&thread_id).await;
    let result = {
        let _guard = lock.lock().await;
        st.engine.run_turn(&thread_id, &query).await
    };
    drop(lock);
    st.release_lock(&thread_id).await;

    let result = result.map_err(|e| {
        error!(thread_id, error = %e, "Turn failed");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(ChatResponse { result }))
}

async fn get_transcript(
    State(st): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let history = st
        .engine
        .store()
        .history(&thread_id)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(TranscriptResponse {
        thread_id,
        messages: to_transcript(&history),
    }))
}

async fn list_threads(State(st): State<AppState>) -> Result<Json<ListingResponse>, ApiError> {
    let ids = st
        .engine
        .store()
        .thread_ids()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(ListingResponse { result: ids }))
}

/// Project the stored history into the user-facing transcript
///
/// Tool results and tool-call-only assistant messages are loop plumbing,
/// not conversation, so they are omitted.
fn to_transcript(history: &[ChatMessage]) -> Vec<TranscriptMessage> {
    history
        .iter()
        .filter_map(|msg| match msg.role {
            ChatRole::User => Some(TranscriptMessage {
                sender: "user".to_string(),
                text: msg.content.clone(),
            }),
            ChatRole::Assistant if !msg.content.is_empty() => Some(TranscriptMessage {
                sender: "ai".to_string(),
                text: msg.content.clone(),
            }),
            _ => None,
        })
        .collect()
}
