//! Viewer sink contract: pushing streamed chunks to live viewers of a
//! conversation

use async_trait::async_trait;

/// Delivers streamed text chunks to subscribers of a conversation's topic.
/// Delivery is at most once per chunk; the transport behind it is out of
/// scope here.
#[async_trait]
pub trait ChunkPublisher: Send + Sync {
    async fn publish(&self, conversation_id: i64, chunk: &str);
}

/// Publisher that drops every chunk; used when no live viewers exist
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl ChunkPublisher for NoopPublisher {
    async fn publish(&self, _conversation_id: i64, _chunk: &str) {}
}
