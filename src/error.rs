//! Error types for the ycmd client runtime.
//!
//! Errors are organized by subsystem: session (server lifecycle) and
//! request (individual protocol exchanges). Session-level failures kill the
//! session and require an explicit restart; request-level failures reject
//! only the exchange that produced them.

use std::time::Duration;

use thiserror::Error;

/// Errors related to server session lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The completion server process failed to spawn.
    #[error("failed to spawn completion server: {0}")]
    SpawnFailed(String),

    /// The server never announced a listening endpoint within the startup
    /// budget. Fatal: the child is killed and no session is left behind.
    #[error("server did not announce readiness within {0:?}")]
    ServerTimeout(Duration),

    /// The server process exited before announcing readiness.
    #[error("server exited during startup: {0}")]
    EarlyExit(String),

    /// Writing the one-shot startup descriptor failed.
    #[error("failed to write startup descriptor: {0}")]
    Descriptor(#[source] std::io::Error),

    /// An operation required a running session and none exists.
    #[error("no completion server session is running")]
    NotRunning,
}

/// Errors produced by individual request/response exchanges.
///
/// None of these terminate the session: the server stays up and later
/// requests may succeed.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Transport-level failure (connection refused, reset, timeout).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused the request. An HMAC mismatch surfaces here too;
    /// the server does not return a status the client could tell apart from
    /// any other rejection.
    #[error("server rejected request with status {status}")]
    Rejected {
        /// HTTP status code returned by the server.
        status: reqwest::StatusCode,
    },

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Lazily starting the server for this request failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// A unified error type for the entire crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Session lifecycle error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Request exchange error.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for ycmd client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::SpawnFailed("no such file".to_string());
        assert_eq!(
            err.to_string(),
            "failed to spawn completion server: no such file"
        );
    }

    #[test]
    fn test_server_timeout_display_includes_budget() {
        let err = SessionError::ServerTimeout(Duration::from_secs(3));
        assert!(err.to_string().contains("3s"));
    }

    #[test]
    fn test_error_conversion() {
        let session_err = SessionError::NotRunning;
        let err: Error = session_err.into();
        assert!(matches!(err, Error::Session(SessionError::NotRunning)));
    }

    #[test]
    fn test_request_error_from_session_error() {
        let session_err = SessionError::NotRunning;
        let req_err: RequestError = session_err.into();
        assert!(matches!(req_err, RequestError::Session(_)));
    }
}
