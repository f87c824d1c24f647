//! Internal conversation model: conversations, turns, attached files

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

/// A file attached to a turn, already reduced to text by the
/// file-processing collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFile {
    pub name: String,
    pub text: String,
}

impl TurnFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// One message in a conversation, from either the human or the backend.
/// Immutable once persisted, except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub conversation_id: i64,
    pub text: String,
    pub origin: Origin,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<TurnFile>,
}

impl Turn {
    /// Create a user turn with attached files
    pub fn user(conversation_id: i64, text: impl Into<String>, files: Vec<TurnFile>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            text: text.into(),
            origin: Origin::User,
            created_at: Utc::now(),
            files,
        }
    }

    /// Create a backend reply turn
    pub fn assistant(conversation_id: i64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            text: text.into(),
            origin: Origin::Assistant,
            created_at: Utc::now(),
            files: vec![],
        }
    }
}

/// A conversation and its backend continuation state. The continuation
/// handle moves forward exactly once per completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub name: String,
    /// Handle of the last completed exchange; `None` until the first
    /// exchange completes
    pub continuation_handle: Option<String>,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            continuation_handle: None,
            turns: vec![],
        }
    }
}
