//! Per-conversation continuation-handle cache, read-through and
//! write-through against the durable store

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::store::ConversationStore;

/// Maps conversation id to the last known continuation handle. The cached
/// value is itself optional: a cached `None` records "no prior exchange,
/// send full context" and spares repeated durable lookups for brand-new
/// conversations.
pub struct HandleCache {
    store: Arc<dyn ConversationStore>,
    entries: Mutex<HashMap<i64, Option<String>>>,
}

impl HandleCache {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Read-through get: a miss falls through to the durable store and
    /// repopulates the cache before returning, so the cache never serves a
    /// handle staler than what the store holds.
    pub async fn get(&self, conversation_id: i64) -> Result<Option<String>> {
        if let Some(handle) = self.entries.lock().get(&conversation_id) {
            return Ok(handle.clone());
        }

        tracing::debug!(conversation_id, "handle cache miss");
        let handle = self.store.load_conversation_handle(conversation_id).await?;
        self.entries
            .lock()
            .insert(conversation_id, handle.clone());
        Ok(handle)
    }

    /// Write-through set: the durable write completes before the cache
    /// reflects it, so a crash between the two never leaves the cache
    /// ahead of durable state. Concurrent sets for one conversation are
    /// last-writer-wins, an accepted relaxation.
    pub async fn set(&self, conversation_id: i64, handle: &str) -> Result<()> {
        self.store
            .save_conversation_handle(conversation_id, handle)
            .await?;
        self.entries
            .lock()
            .insert(conversation_id, Some(handle.to_string()));
        Ok(())
    }
}
