//! API request and response types

use crate::state_machine::{Reply, SuggestedAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Kind of activity delivered by a chat channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    /// A user joined the conversation
    ConversationUpdate,
    Message,
}

/// Conversation reference carried by an activity
#[derive(Debug, Deserialize)]
pub struct ConversationRef {
    pub id: String,
}

/// Inbound activity from a chat channel
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub conversation: ConversationRef,
    #[serde(default)]
    pub text: Option<String>,
}

/// Replies produced for one activity
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub conversation_id: String,
    pub replies: Vec<Reply>,
}

/// Response with a list of conversations
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<serde_json::Value>,
}

/// Response with a single conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: serde_json::Value,
}

/// Response with conversation, its order and messages
#[derive(Debug, Serialize)]
pub struct ConversationWithMessagesResponse {
    pub conversation: serde_json::Value,
    pub messages: Vec<serde_json::Value>,
    /// Order total so far; zero until a quantity is accepted
    pub total: Decimal,
}

/// One priced menu entry
#[derive(Debug, Serialize)]
pub struct MenuItemInfo {
    pub label: String,
    pub unit_price: Decimal,
    pub title: String,
}

/// Response for the menu
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub items: Vec<MenuItemInfo>,
    pub suggested_actions: Vec<SuggestedAction>,
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
