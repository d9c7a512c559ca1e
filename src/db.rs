//! Database module for Cafe Cammi
//!
//! Persists each conversation's order state and its transcript.

mod schema;

pub use schema::*;

use crate::state_machine::SuggestedAction;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Conversation already exists: {0}")]
    ConversationExists(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

const CONVERSATION_COLUMNS: &str = "c.id, c.state, c.created_at, c.updated_at,
    (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) as message_count";

const MESSAGE_COLUMNS: &str =
    "message_id, conversation_id, sequence_id, direction, text, suggested_actions, created_at";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Conversation Operations ====================

    /// Create a new conversation with an empty order
    pub fn create_conversation(&self, id: &str) -> DbResult<Conversation> {
        let conn = self.conn()?;
        let now = Utc::now();
        let state = OrderState::default();
        let state_json = serde_json::to_string(&state)?;

        conn.execute(
            "INSERT INTO conversations (id, state, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![id, state_json, now.to_rfc3339()],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::ConversationExists(id.to_string())
            }
            other => DbError::Sqlite(other),
        })?;

        Ok(Conversation {
            id: id.to_string(),
            state,
            created_at: now,
            updated_at: now,
            message_count: 0,
        })
    }

    /// Get conversation by ID
    pub fn get_conversation(&self, id: &str) -> DbResult<Conversation> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?1"
        ))?;

        stmt.query_row(params![id], parse_conversation_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::ConversationNotFound(id.to_string())
                }
                other => DbError::Sqlite(other),
            })
    }

    /// Whether a conversation row exists
    pub fn conversation_exists(&self, id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM conversations WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List conversations, most recently active first
    pub fn list_conversations(&self) -> DbResult<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c ORDER BY c.updated_at DESC"
        ))?;

        let rows = stmt.query_map([], parse_conversation_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a conversation and all its messages
    pub fn delete_conversation(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;

        // Messages are deleted by CASCADE
        let deleted = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== Order State ====================

    /// Load the order for a conversation; unknown conversations start empty
    pub fn load_order_state(&self, id: &str) -> DbResult<OrderState> {
        let conn = self.conn()?;
        let state_json: Option<String> = conn
            .query_row(
                "SELECT state FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(state_json.map(|s| parse_state(&s)).unwrap_or_default())
    }

    /// Save the order for an existing conversation.
    ///
    /// Never recreates a row: a turn still in flight when its conversation
    /// is deleted fails with `ConversationNotFound`.
    pub fn save_order_state(&self, id: &str, state: &OrderState) -> DbResult<()> {
        let conn = self.conn()?;
        let now = Utc::now();
        let state_json = serde_json::to_string(state)?;

        let updated = conn.execute(
            "UPDATE conversations SET state = ?1, updated_at = ?2 WHERE id = ?3",
            params![state_json, now.to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== Message Operations ====================

    /// Append a message to a conversation's transcript
    pub fn add_message(
        &self,
        message_id: &str,
        conversation_id: &str,
        direction: Direction,
        text: &str,
        suggested_actions: &[SuggestedAction],
    ) -> DbResult<Message> {
        let conn = self.conn()?;
        let now = Utc::now();

        // Get next sequence ID
        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;

        let actions_str = if suggested_actions.is_empty() {
            None
        } else {
            Some(serde_json::to_string(suggested_actions)?)
        };

        conn.execute(
            "INSERT INTO messages (message_id, conversation_id, sequence_id, direction, text, suggested_actions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message_id,
                conversation_id,
                sequence_id,
                direction.to_string(),
                text,
                actions_str,
                now.to_rfc3339(),
            ],
        )?;

        // Update conversation timestamp
        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), conversation_id],
        )?;

        Ok(Message {
            message_id: message_id.to_string(),
            conversation_id: conversation_id.to_string(),
            sequence_id,
            direction,
            text: text.to_string(),
            suggested_actions: suggested_actions.to_vec(),
            created_at: now,
        })
    }

    /// Get messages for a conversation
    pub fn get_messages(&self, conversation_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY sequence_id ASC"
        ))?;

        let rows = stmt.query_map(params![conversation_id], parse_message_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get messages after a sequence ID
    pub fn get_messages_after(
        &self,
        conversation_id: &str,
        after_sequence: i64,
    ) -> DbResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = ?1 AND sequence_id > ?2 ORDER BY sequence_id ASC"
        ))?;

        let rows = stmt.query_map(params![conversation_id, after_sequence], parse_message_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get the last sequence ID for a conversation
    pub fn get_last_sequence_id(&self, conversation_id: &str) -> DbResult<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )
        .map_err(DbError::from)
    }
}

/// A corrupt state column loads as an empty order rather than failing the turn
fn parse_state(json: &str) -> OrderState {
    serde_json::from_str(json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable order state, starting a new order");
        OrderState::default()
    })
}

fn parse_conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let state_json: String = row.get(1)?;
    Ok(Conversation {
        id: row.get(0)?,
        state: parse_state(&state_json),
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_datetime(&row.get::<_, String>(3)?),
        message_count: row.get(4)?,
    })
}

fn parse_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        message_id: row.get(0)?,
        conversation_id: row.get(1)?,
        sequence_id: row.get(2)?,
        direction: parse_direction(&row.get::<_, String>(3)?),
        text: row.get(4)?,
        suggested_actions: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn parse_direction(s: &str) -> Direction {
    match s {
        "user" => Direction::User,
        _ => Direction::Bot,
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
