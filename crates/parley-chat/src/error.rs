//! Error types for parley-chat

use thiserror::Error;

/// Result type alias using parley-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating a conversation turn. Every
/// failure reaches the caller typed by kind; nothing is swallowed and no
/// retries happen below this layer.
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the backend protocol layer
    #[error(transparent)]
    Backend(#[from] parley_ai::Error),

    /// A failure inside the durable store collaborator
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Whether the caller may safely retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend(e) if e.is_retryable())
    }
}
