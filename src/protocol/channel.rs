//! The asynchronous request/response channel.
//!
//! One channel serves a whole runtime: it shares the supervisor behind a
//! mutex, lazily starts the server when the first request of a session
//! arrives, and signs every outgoing body with the current session's
//! secret. Requests are never retried here; a transport failure or server
//! rejection fails only the exchange that hit it.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{RequestError, SessionError};
use crate::session::{ServerSupervisor, SessionInfo};

use super::{RequestResult, paths, sign};

/// Signed asynchronous request channel to the supervised server.
pub struct RequestChannel {
    supervisor: Arc<Mutex<ServerSupervisor>>,
    http: reqwest::Client,
}

impl RequestChannel {
    /// Creates a channel over the given supervisor.
    pub fn new(supervisor: Arc<Mutex<ServerSupervisor>>) -> Self {
        Self {
            supervisor,
            http: reqwest::Client::builder()
                .user_agent(concat!("ycmd-client/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Returns the current session, starting the server if necessary.
    ///
    /// This is what makes the first request of a session implicitly spawn
    /// the server.
    async fn ensure_session(&self) -> RequestResult<SessionInfo> {
        let mut supervisor = self.supervisor.lock().await;
        if !supervisor.is_running() {
            debug!("no running session, starting completion server");
            supervisor.start().await?;
        }
        supervisor
            .session_info()
            .ok_or(RequestError::Session(SessionError::NotRunning))
    }

    /// Sends a signed POST and returns the raw response body.
    ///
    /// ## Errors
    /// `RequestError::Transport` on connection failure,
    /// `RequestError::Rejected` on a non-2xx status (an HMAC mismatch is
    /// indistinguishable from any other rejection), `Encode` if the body
    /// cannot be serialized, `Session` if lazy startup fails.
    pub async fn post_raw<B: Serialize>(&self, path: &str, body: &B) -> RequestResult<String> {
        let session = self.ensure_session().await?;
        let body = serde_json::to_string(body).map_err(RequestError::Encode)?;

        let response = self
            .http
            .post(format!("{}{}", session.base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(sign::HMAC_HEADER, sign::signature(&session.secret, body.as_bytes()))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, path, "server rejected request");
            return Err(RequestError::Rejected { status });
        }
        Ok(response.text().await?)
    }

    /// Sends a signed POST and decodes the response as JSON.
    ///
    /// ## Errors
    /// Everything `post_raw` produces, plus `RequestError::Decode`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> RequestResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let raw = self.post_raw(path, body).await?;
        serde_json::from_str(&raw).map_err(RequestError::Decode)
    }

    /// Probes the server's health endpoint.
    ///
    /// The GET carries a signature over the empty body; the response body
    /// is ignored.
    pub async fn health_check(&self) -> RequestResult<()> {
        let session = self.ensure_session().await?;

        let response = self
            .http
            .get(format!("{}{}", session.base_url, paths::HEALTHY))
            .header(sign::HMAC_HEADER, sign::signature(&session.secret, b""))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Rejected { status });
        }
        Ok(())
    }
}
