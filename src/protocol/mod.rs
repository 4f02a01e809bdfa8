//! Authenticated HTTP protocol layer.
//!
//! Every exchange with the completion server goes through this module: the
//! request body is serialized to canonical JSON, signed with the session
//! secret, and sent to the server's discovered endpoint. Authentication is
//! one-directional — the client signs what it sends and does not verify
//! responses.
//!
//! - `sign`: HMAC signature computation for the request header
//! - `wire`: request payload builders and decoded response types
//! - `channel`: the asynchronous request/response channel itself

pub mod channel;
pub mod sign;
pub mod wire;

use crate::error::RequestError;

/// Result type for protocol exchanges.
pub type RequestResult<T> = std::result::Result<T, RequestError>;

/// Server endpoint paths.
pub mod paths {
    /// Buffer-parse event notifications; responds with parse results.
    pub const EVENT_NOTIFICATION: &str = "/event_notification";
    /// Completion candidates for a cursor position.
    pub const COMPLETIONS: &str = "/completions";
    /// Completer subcommands (navigation and friends).
    pub const RUN_COMPLETER_COMMAND: &str = "/run_completer_command";
    /// Explicitly trust an extra-conf file.
    pub const LOAD_EXTRA_CONF: &str = "/load_extra_conf_file";
    /// Liveness probe; the response body is ignored.
    pub const HEALTHY: &str = "/healthy";
}
