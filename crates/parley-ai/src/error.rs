//! Error types for parley-ai

use thiserror::Error;

/// Result type alias using parley-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the inference backend
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration key with no matching backend profile. Caller error.
    #[error("unknown backend profile: {0}")]
    UnknownProfile(String),

    /// Network-level failure or non-2xx status from the backend.
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        /// HTTP status code, when one was received
        status: Option<u16>,
        message: String,
    },

    /// The profile's call deadline was exceeded. The attempt is abandoned,
    /// not retried here.
    #[error("backend call exceeded the {limit_secs}s deadline")]
    Timeout { limit_secs: u64 },

    /// Mid-stream decode or transport failure. The partial response under
    /// construction is discarded, never returned as if complete.
    #[error("stream corrupted: {0}")]
    StreamCorrupted(String),

    /// Well-formed transport but un-mappable content. A backend contract
    /// violation, not a user error.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Caller-initiated cancellation.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Create a BackendUnavailable error from a status and message
    pub fn unavailable(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            status,
            message: message.into(),
        }
    }

    /// Whether the caller may safely retry the same call. StreamCorrupted is
    /// excluded: the continuation state after a broken stream is
    /// indeterminate, so a retry must be issued as a fresh turn.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable { .. } | Error::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_unavailable_and_timeout() {
        assert!(Error::unavailable(Some(503), "overloaded").is_retryable());
        assert!(Error::unavailable(None, "connection refused").is_retryable());
        assert!(Error::Timeout { limit_secs: 30 }.is_retryable());
    }

    #[test]
    fn test_not_retryable_caller_and_contract_errors() {
        assert!(!Error::UnknownProfile("nope".into()).is_retryable());
        assert!(!Error::MalformedResponse("no text blocks".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_not_retryable_stream_corrupted() {
        // A broken stream leaves continuation state indeterminate.
        assert!(!Error::StreamCorrupted("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_unavailable_display_keeps_message() {
        let e = Error::unavailable(Some(502), "bad gateway");
        assert!(e.to_string().contains("bad gateway"));
    }
}
