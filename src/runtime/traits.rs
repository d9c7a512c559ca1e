//! Trait abstractions for runtime I/O
//!
//! These traits let the executor run against the database or an in-memory
//! mock.

use crate::db::{Database, Direction, Message};
use crate::state_machine::{OrderState, SuggestedAction};
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for conversation transcripts
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to the conversation
    async fn add_message(
        &self,
        conv_id: &str,
        direction: Direction,
        text: &str,
        suggested_actions: &[SuggestedAction],
    ) -> Result<Message, String>;

    /// Get all messages for a conversation
    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, String>;
}

/// Keyed store of order state, one slot per conversation
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Current order; an unknown conversation yields the empty order
    async fn load_state(&self, conv_id: &str) -> Result<OrderState, String>;

    /// Replace the conversation's order
    async fn save_state(&self, conv_id: &str, state: &OrderState) -> Result<(), String>;
}

/// Combined storage trait for convenience
pub trait Storage: MessageStore + StateStore {}
impl<T: MessageStore + StateStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageStore + ?Sized> MessageStore for Arc<T> {
    async fn add_message(
        &self,
        conv_id: &str,
        direction: Direction,
        text: &str,
        suggested_actions: &[SuggestedAction],
    ) -> Result<Message, String> {
        (**self)
            .add_message(conv_id, direction, text, suggested_actions)
            .await
    }

    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, String> {
        (**self).get_messages(conv_id).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load_state(&self, conv_id: &str) -> Result<OrderState, String> {
        (**self).load_state(conv_id).await
    }

    async fn save_state(&self, conv_id: &str, state: &OrderState) -> Result<(), String> {
        (**self).save_state(conv_id, state).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageStore for DatabaseStorage {
    async fn add_message(
        &self,
        conv_id: &str,
        direction: Direction,
        text: &str,
        suggested_actions: &[SuggestedAction],
    ) -> Result<Message, String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.db
            .add_message(&id, conv_id, direction, text, suggested_actions)
            .map_err(|e| e.to_string())
    }

    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, String> {
        self.db.get_messages(conv_id).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn load_state(&self, conv_id: &str) -> Result<OrderState, String> {
        self.db.load_order_state(conv_id).map_err(|e| e.to_string())
    }

    async fn save_state(&self, conv_id: &str, state: &OrderState) -> Result<(), String> {
        self.db
            .save_order_state(conv_id, state)
            .map_err(|e| e.to_string())
    }
}
