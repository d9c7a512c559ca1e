//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ActivityRequest, ActivityResponse, ActivityType, ChatRequest, ChatResponse,
    ConversationListResponse, ConversationResponse, ConversationWithMessagesResponse,
    ErrorResponse, MenuItemInfo, MenuResponse, SuccessResponse,
};
use super::AppState;
use crate::db::DbError;
use crate::runtime::SseEvent;
use crate::state_machine::Event;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Menu
        .route("/api/menu", get(get_menu))
        // Conversations
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id", get(get_conversation))
        .route("/api/conversations/:id/stream", get(stream_conversation))
        .route("/api/conversations/:id/chat", post(send_chat))
        .route("/api/conversations/:id/delete", post(delete_conversation))
        // Chat-channel activities, answered synchronously
        .route("/api/messages", post(receive_activity))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Menu
// ============================================================

async fn get_menu(State(state): State<AppState>) -> Json<MenuResponse> {
    let menu = state.runtime.menu();
    let items = menu
        .items()
        .iter()
        .map(|item| MenuItemInfo {
            label: item.label.clone(),
            unit_price: item.unit_price,
            title: item.title(),
        })
        .collect();

    Json(MenuResponse {
        items,
        suggested_actions: menu.suggested_actions(),
    })
}

// ============================================================
// Conversations
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let conversations = state
        .runtime
        .db()
        .list_conversations()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_convs: Vec<Value> = conversations
        .into_iter()
        .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
        .collect();

    Ok(Json(ConversationListResponse {
        conversations: json_convs,
    }))
}

/// Create a conversation and greet it
async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<ConversationResponse>, AppError> {
    let id = uuid::Uuid::new_v4().to_string();

    state
        .runtime
        .db()
        .create_conversation(&id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    state
        .runtime
        .run_turn(&id, Event::ConversationStarted)
        .await
        .map_err(AppError::Internal)?;

    let conversation = state
        .runtime
        .db()
        .get_conversation(&id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(conv_id = %id, "Conversation created");

    Ok(Json(ConversationResponse {
        conversation: serde_json::to_value(conversation).unwrap_or(Value::Null),
    }))
}

#[derive(Debug, Deserialize)]
struct GetConversationQuery {
    after_sequence: Option<i64>,
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GetConversationQuery>,
) -> Result<Json<ConversationWithMessagesResponse>, AppError> {
    let conversation = state
        .runtime
        .db()
        .get_conversation(&id)
        .map_err(AppError::from_db)?;

    let messages = if let Some(after) = query.after_sequence {
        state.runtime.db().get_messages_after(&id, after)
    } else {
        state.runtime.db().get_messages(&id)
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_msgs: Vec<Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
        .collect();

    Ok(Json(ConversationWithMessagesResponse {
        total: conversation.state.total(),
        conversation: serde_json::to_value(&conversation).unwrap_or(Value::Null),
        messages: json_msgs,
    }))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    after: Option<i64>,
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = state
        .runtime
        .db()
        .get_conversation(&id)
        .map_err(AppError::from_db)?;

    // Subscribe before reading history so no message falls between the two
    let broadcast_rx = state
        .runtime
        .subscribe(&id)
        .await
        .map_err(AppError::Internal)?;

    let messages = if let Some(after) = query.after {
        state.runtime.db().get_messages_after(&id, after)
    } else {
        state.runtime.db().get_messages(&id)
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let last_sequence_id = state.runtime.db().get_last_sequence_id(&id).unwrap_or(0);

    let json_msgs: Vec<Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
        .collect();

    let init_event = SseEvent::Init {
        conversation: serde_json::to_value(&conversation).unwrap_or(Value::Null),
        messages: json_msgs,
        last_sequence_id,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if !state
        .runtime
        .db()
        .conversation_exists(&id)
        .map_err(AppError::from_db)?
    {
        return Err(AppError::NotFound(
            DbError::ConversationNotFound(id).to_string(),
        ));
    }

    state
        .runtime
        .send_event(&id, Event::user_message(req.text))
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(ChatResponse { queued: true }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.remove(&id).await;
    state
        .runtime
        .db()
        .delete_conversation(&id)
        .map_err(AppError::from_db)?;

    tracing::info!(conv_id = %id, "Conversation deleted");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Activities
// ============================================================

/// Run one channel activity to completion and return its replies.
///
/// Unknown conversations are created on first contact.
async fn receive_activity(
    State(state): State<AppState>,
    Json(req): Json<ActivityRequest>,
) -> Result<Json<ActivityResponse>, AppError> {
    let conv_id = req.conversation.id;
    if conv_id.is_empty() {
        return Err(AppError::BadRequest(
            "conversation.id must not be empty".to_string(),
        ));
    }

    let event = match req.activity_type {
        ActivityType::ConversationUpdate => Event::ConversationStarted,
        ActivityType::Message => {
            let text = req.text.ok_or_else(|| {
                AppError::BadRequest("message activity requires text".to_string())
            })?;
            Event::user_message(text)
        }
    };

    state
        .runtime
        .ensure_conversation(&conv_id)
        .map_err(AppError::Internal)?;

    let replies = state
        .runtime
        .run_turn(&conv_id, event)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(ActivityResponse {
        conversation_id: conv_id,
        replies,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("cafe-cammi ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn from_db(e: DbError) -> Self {
        match e {
            DbError::ConversationNotFound(_) => AppError::NotFound(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
