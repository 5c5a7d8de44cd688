//! HTTP chat server.
//!
//! Exposes the assistant to a storefront UI over JSON. Each session id maps
//! to one [`Conversation`], restored from SQLite the first time it is used
//! and kept in memory for the life of the process.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Send a message, get the reply and the updated log |
//! | `GET`  | `/sessions/{id}/messages` | Current log and loading flag (404 if unknown) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use shopbot_core::models::{Intent, Message};
use shopbot_core::Conversation;

use crate::backend::Backend;
use crate::config::{Config, DEFAULT_MAX_SESSIONS};

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

struct Session {
    conversation: Arc<Conversation>,
    last_used: Instant,
}

/// Shared application state passed to all route handlers.
///
/// Holds at most `max_sessions` live conversations; opening one more evicts
/// the least recently used. An evicted session is restored from the history
/// store the next time it is used.
#[derive(Clone)]
pub struct AppState {
    backend: Backend,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    max_sessions: usize,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Number of conversations currently held in memory.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// The live conversation for `session_id`, opening it if needed.
    async fn conversation(&self, session_id: &str) -> Arc<Conversation> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_used = Instant::now();
            return session.conversation.clone();
        }

        let conversation = Arc::new(self.backend.conversation(session_id).await);
        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }
        sessions.insert(
            session_id.to_string(),
            Session {
                conversation: conversation.clone(),
                last_used: Instant::now(),
            },
        );
        tracing::info!(session = session_id, "session opened");
        conversation
    }

    /// The live conversation for `session_id`, without opening one.
    async fn live(&self, session_id: &str) -> Option<Arc<Conversation>> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).map(|s| s.conversation.clone())
    }
}

fn evict_least_recent(sessions: &mut HashMap<String, Session>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, s)| s.last_used)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        sessions.remove(&id);
        tracing::debug!(session = %id, "session evicted");
    }
}

/// Build the router with CORS open to any origin.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/sessions/{id}/messages", get(handle_messages))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the chat server on `[server].bind` and runs until the process ends.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backend = Backend::open(config).await?;
    let app = router(AppState::new(backend).with_max_sessions(config.server.max_sessions));

    let bind_addr = &config.server.bind;
    tracing::info!(%bind_addr, "chat server listening");
    println!("Chat server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /chat ============

#[derive(Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new session.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub intent: Intent,
    pub reply: String,
    pub loading: bool,
    pub messages: Vec<Message>,
}

/// Handler for `POST /chat`.
///
/// Returns `400` for an empty or oversized message. Catalog failures are
/// not errors here: they arrive as an apology in `reply`.
async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = req.message.trim();
    if text.is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(bad_request(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let session_id = match req.session_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let conversation = state.conversation(&session_id).await;
    let reply = conversation.send_message(text).await;
    let snapshot = conversation.snapshot();

    Ok(Json(ChatResponse {
        session_id,
        intent: reply.intent,
        reply: reply.text,
        loading: snapshot.loading,
        messages: snapshot.messages,
    }))
}

// ============ GET /sessions/{id}/messages ============

#[derive(Serialize)]
struct MessagesResponse {
    session_id: String,
    loading: bool,
    messages: Vec<Message>,
}

/// Handler for `GET /sessions/{id}/messages`.
///
/// Read-only: a session that is not live is answered from the history
/// store and is not opened.
async fn handle_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    if let Some(conversation) = state.live(&session_id).await {
        let snapshot = conversation.snapshot();
        return Ok(Json(MessagesResponse {
            session_id: snapshot.session_id,
            loading: snapshot.loading,
            messages: snapshot.messages,
        }));
    }

    let messages = state
        .backend
        .history()
        .load(&session_id)
        .await
        .map_err(|e| {
            tracing::error!(session = %session_id, error = %e, "history load failed");
            internal_error("failed to load session history")
        })?;
    if messages.is_empty() {
        return Err(not_found(format!("no session '{}'", session_id)));
    }

    Ok(Json(MessagesResponse {
        session_id,
        loading: false,
        messages,
    }))
}
