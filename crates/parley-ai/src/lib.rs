//! parley-ai: inference backend protocol layer
//!
//! Wire shapes, backend profiles and their routing table, the HTTP client,
//! and the streaming reader that turns an incremental response into one
//! structured object while forwarding chunks live.

pub mod client;
pub mod error;
pub mod profile;
pub mod stream;
pub mod types;

pub use client::{API_KEY_ENV_VAR, Backend, InferenceClient};
pub use error::{Error, Result};
pub use profile::{BackendProfile, ProfileRouter};
pub use stream::{ChunkSink, ReaderState, StreamChunk, StreamReader, TransportStream};
pub use types::*;
