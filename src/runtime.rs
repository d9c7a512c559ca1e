//! Runtime for executing conversations
//!
//! One task per conversation keeps its turns strictly ordered; separate
//! conversations run independently.

mod executor;
pub mod traits;


pub use executor::ConversationRuntime;
pub use traits::*;

use crate::db::{Database, DbError, Message};
use crate::menu::MenuCatalog;
use crate::state_machine::{Event, OrderState, Reply};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<DatabaseStorage>;

/// Replies produced by one turn, or why the turn was dropped
pub type TurnResult = Result<Vec<Reply>, String>;

/// An event waiting in a conversation's queue
#[derive(Debug)]
pub struct QueuedEvent {
    pub event: Event,
    /// Receives the turn's replies once processed
    pub respond_to: Option<oneshot::Sender<TurnResult>>,
}

impl QueuedEvent {
    pub fn fire_and_forget(event: Event) -> Self {
        Self {
            event,
            respond_to: None,
        }
    }
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    db: Database,
    menu: Arc<MenuCatalog>,
    turn_timeout: Duration,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub event_tx: mpsc::Sender<QueuedEvent>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        conversation: serde_json::Value,
        messages: Vec<serde_json::Value>,
        last_sequence_id: i64,
    },
    Message {
        message: Message,
    },
    StateChange {
        state: OrderState,
    },
    /// Sent after every processed event, successful or not
    TurnComplete,
    Error {
        message: String,
    },
}

impl RuntimeManager {
    pub fn new(db: Database, menu: Arc<MenuCatalog>, turn_timeout: Duration) -> Self {
        Self {
            db,
            menu,
            turn_timeout,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create a runtime for an existing conversation
    pub async fn get_or_create(&self, conversation_id: &str) -> Result<ConversationHandle, String> {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(conversation_id) {
                if !handle.event_tx.is_closed() {
                    return Ok(handle.clone());
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another request may have started it while we waited for the lock
        if let Some(handle) = runtimes.get(conversation_id) {
            if !handle.event_tx.is_closed() {
                return Ok(handle.clone());
            }
            tracing::warn!(conv_id = %conversation_id, "Conversation runtime exited, restarting");
            runtimes.remove(conversation_id);
        }

        if !self
            .db
            .conversation_exists(conversation_id)
            .map_err(|e| e.to_string())?
        {
            return Err(DbError::ConversationNotFound(conversation_id.to_string()).to_string());
        }

        let storage = DatabaseStorage::new(self.db.clone());
        let state = storage.load_state(conversation_id).await?;

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            conversation_id,
            state,
            self.menu.clone(),
            storage,
            event_rx,
            broadcast_tx.clone(),
        );

        // Start runtime in background
        let conv_id = conversation_id.to_string();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
        });

        let handle = ConversationHandle {
            event_tx,
            broadcast_tx,
        };
        runtimes.insert(conversation_id.to_string(), handle.clone());

        Ok(handle)
    }

    /// Create the conversation if it is not yet known
    pub fn ensure_conversation(&self, conversation_id: &str) -> Result<(), String> {
        if self
            .db
            .conversation_exists(conversation_id)
            .map_err(|e| e.to_string())?
        {
            return Ok(());
        }
        match self.db.create_conversation(conversation_id) {
            Ok(_) | Err(DbError::ConversationExists(_)) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Queue an event without waiting for the turn
    pub async fn send_event(&self, conversation_id: &str, event: Event) -> Result<(), String> {
        let handle = self.get_or_create(conversation_id).await?;
        handle
            .event_tx
            .send(QueuedEvent::fire_and_forget(event))
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Queue an event and wait for its replies
    pub async fn run_turn(&self, conversation_id: &str, event: Event) -> TurnResult {
        let handle = self.get_or_create(conversation_id).await?;
        let (tx, rx) = oneshot::channel();

        handle
            .event_tx
            .send(QueuedEvent {
                event,
                respond_to: Some(tx),
            })
            .await
            .map_err(|e| format!("Failed to send event: {e}"))?;

        match tokio::time::timeout(self.turn_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err("Conversation runtime stopped".to_string()),
            Err(_) => Err(format!(
                "Turn did not complete within {}ms",
                self.turn_timeout.as_millis()
            )),
        }
    }

    /// Subscribe to conversation updates
    pub async fn subscribe(
        &self,
        conversation_id: &str,
    ) -> Result<broadcast::Receiver<SseEvent>, String> {
        let handle = self.get_or_create(conversation_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Stop a conversation's runtime, if running
    pub async fn remove(&self, conversation_id: &str) {
        // Dropping the last sender ends the runtime loop
        self.runtimes.write().await.remove(conversation_id);
    }

    /// Get the database handle
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn menu(&self) -> &Arc<MenuCatalog> {
        &self.menu
    }
}
