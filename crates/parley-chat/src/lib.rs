//! Conversation orchestration over the `parley-ai` backend layer: prompt
//! assembly, request/response mapping, durable turn storage, a
//! continuation-handle cache, and the send-turn orchestrator.

pub mod cache;
pub mod conversation;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod prompt;
pub mod publish;
pub mod store;

pub use cache::HandleCache;
pub use conversation::{Conversation, Origin, Turn, TurnFile};
pub use error::{Error, Result};
pub use orchestrator::{ChatService, SendOptions};
pub use publish::{ChunkPublisher, NoopPublisher};
pub use store::{ConversationStore, MemoryStore};
