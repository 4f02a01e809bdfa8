//! Server session subsystem.
//!
//! A session is one running completion-server process plus the connection
//! parameters derived while starting it: the host and port scraped from the
//! server's own readiness announcement, and the shared secret minted for
//! exactly this process. The subsystem is split into:
//!
//! - `secret`: shared-secret generation and the one-shot startup descriptor
//!   the server consumes (and deletes) on boot
//! - `supervisor`: child process spawn, readiness detection, and teardown
//!
//! At most one session exists per supervisor; starting a new one always
//! tears down the previous one first.

pub mod secret;
pub mod supervisor;

use crate::error::SessionError;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

pub use supervisor::{ServerSupervisor, SessionInfo};
