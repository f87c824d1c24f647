//! Persistence contract required from the durable store, plus an in-memory
//! implementation for the CLI and tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::conversation::Turn;
use crate::error::Result;

/// Repository contract the orchestration core requires. The storage engine
/// behind it is out of scope; single-row writes (one conversation's handle,
/// one turn) are assumed atomic, and no multi-row transaction spans a
/// handle update and a turn write.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored continuation handle for a conversation; `None` when no
    /// exchange has completed yet
    async fn load_conversation_handle(&self, conversation_id: i64) -> Result<Option<String>>;

    /// Durably record the conversation's latest continuation handle
    async fn save_conversation_handle(&self, conversation_id: i64, handle: &str) -> Result<()>;

    /// Append a turn to its conversation and return the persisted row
    async fn append_turn(&self, turn: Turn) -> Result<Turn>;
}

/// In-memory store backing the CLI's single-process sessions and tests
#[derive(Default)]
pub struct MemoryStore {
    handles: Mutex<HashMap<i64, String>>,
    turns: Mutex<Vec<Turn>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All persisted turns for a conversation, in append order
    pub fn turns_for(&self, conversation_id: i64) -> Vec<Turn> {
        self.turns
            .lock()
            .iter()
            .filter(|turn| turn.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    /// Total number of persisted turns
    pub fn turn_count(&self) -> usize {
        self.turns.lock().len()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load_conversation_handle(&self, conversation_id: i64) -> Result<Option<String>> {
        Ok(self.handles.lock().get(&conversation_id).cloned())
    }

    async fn save_conversation_handle(&self, conversation_id: i64, handle: &str) -> Result<()> {
        self.handles
            .lock()
            .insert(conversation_id, handle.to_string());
        Ok(())
    }

    async fn append_turn(&self, turn: Turn) -> Result<Turn> {
        self.turns.lock().push(turn.clone());
        Ok(turn)
    }
}
