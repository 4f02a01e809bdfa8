//! Completion server supervision.
//!
//! The supervisor spawns the server as a child process, hands it the
//! startup descriptor, and watches the child's stdout for the readiness
//! announcement. The server picks its own listening port, so there is no
//! readiness API to query before the HTTP layer exists — scraping the
//! announcement line is the contract.

use std::path::PathBuf;
use std::process::Stdio;

use async_process::{Child, Command};
use futures::StreamExt;
use futures::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::SessionError;

use super::{SessionResult, secret};

/// Read-only snapshot of a session's connection parameters.
///
/// Handed to the protocol layer; valid only for exchanges addressed to the
/// exact session it was taken from, since the secret changes on restart.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Base URL of the server, e.g. `http://127.0.0.1:6666`.
    pub base_url: String,
    /// Shared secret used to sign every request to this session.
    pub secret: Vec<u8>,
}

/// One running server process plus its derived connection parameters.
#[derive(Debug)]
struct ServerSession {
    child: Child,
    secret: Vec<u8>,
    host: String,
    port: u16,
    descriptor_path: PathBuf,
}

/// Supervises at most one completion server process.
///
/// `start` is stop-before-start: a prior session is always torn down before
/// a new child is spawned, so two children can never be alive at once.
pub struct ServerSupervisor {
    config: ClientConfig,
    session: Option<ServerSession>,
    drain_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ServerSupervisor {
    /// Creates a supervisor with no running session.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
            drain_handle: None,
        }
    }

    /// Starts a fresh server session.
    ///
    /// Provisions a new secret and descriptor, spawns the child with
    /// `--options_file=<path>`, and scans its stdout for the readiness
    /// announcement under the configured wall-clock budget. On timeout the
    /// child is killed and no session is left behind; the failure is not
    /// retried here.
    ///
    /// ## Errors
    /// `SessionError::SpawnFailed`, `ServerTimeout`, `EarlyExit`, or
    /// `Descriptor`.
    pub async fn start(&mut self) -> SessionResult<()> {
        self.stop().await;

        let (secret, descriptor_path) =
            secret::provision(&self.config).map_err(SessionError::Descriptor)?;

        let mut cmd = Command::new(&self.config.server_command);
        cmd.args(&self.config.server_args)
            .arg(format!("--options_file={}", descriptor_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            SessionError::SpawnFailed(format!(
                "failed to spawn '{}': {}",
                self.config.server_command.display(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("failed to capture stdout".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let budget = self.config.startup_timeout();
        let (host, port) = match tokio::time::timeout(budget, scan_for_endpoint(&mut lines)).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(e)) => {
                let _ = child.kill();
                let _ = child.status().await;
                return Err(e);
            }
            Err(_) => {
                warn!(?budget, "completion server never announced readiness");
                let _ = child.kill();
                let _ = child.status().await;
                return Err(SessionError::ServerTimeout(budget));
            }
        };

        info!(%host, port, "completion server ready");

        // Keep consuming output so the child never blocks on a full pipe.
        self.drain_handle = Some(tokio::spawn(async move {
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => debug!(%line, "server output"),
                    Err(_) => break,
                }
            }
        }));

        self.session = Some(ServerSession {
            child,
            secret,
            host,
            port,
            descriptor_path,
        });

        Ok(())
    }

    /// Stops the current session, if any.
    ///
    /// Signal-level termination: the child is killed and reaped, not asked
    /// to shut down. Idempotent — with no active session this is a no-op.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.drain_handle.take() {
            handle.abort();
        }

        if let Some(mut session) = self.session.take() {
            info!(port = session.port, "stopping completion server");
            if let Err(e) = session.child.kill() {
                debug!(error = %e, "kill failed, server probably already exited");
            }
            let _ = session.child.status().await;
            // Orphaned only if the server never consumed it.
            let _ = std::fs::remove_file(&session.descriptor_path);
        }
    }

    /// Whether the supervised process is currently alive.
    pub fn is_running(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => matches!(session.child.try_status(), Ok(None)),
            None => false,
        }
    }

    /// Connection parameters of the current session.
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session.as_ref().map(|s| SessionInfo {
            base_url: format!("http://{}:{}", s.host, s.port),
            secret: s.secret.clone(),
        })
    }
}

/// Scans server output line-by-line for the readiness announcement.
///
/// Arbitrary output before the announcement is tolerated. Returns the
/// discovered `(host, port)`; fails with `EarlyExit` if the stream closes
/// first. The caller bounds the scan with a wall-clock timeout.
async fn scan_for_endpoint<R>(lines: &mut Lines<BufReader<R>>) -> SessionResult<(String, u16)>
where
    R: AsyncRead + Unpin,
{
    let pattern =
        Regex::new(r"serving on http://([^:\s]+):(\d+)").expect("readiness pattern is valid");

    while let Some(line) = lines.next().await {
        let line = line.map_err(|e| SessionError::EarlyExit(e.to_string()))?;
        if let Some(caps) = pattern.captures(&line)
            && let Ok(port) = caps[2].parse::<u16>()
        {
            return Ok((caps[1].to_string(), port));
        }
        debug!(%line, "server output before readiness");
    }

    Err(SessionError::EarlyExit(
        "output stream closed before readiness".to_string(),
    ))
}
