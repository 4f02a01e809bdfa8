//! Client configuration.
//!
//! All knobs for the runtime live here: how to launch the completion server,
//! which extra-conf files to trust, and the timing policy for the debounce
//! and keepalive timers. Deserialization is the validated boundary; a config
//! file only needs to name the fields it overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_server_command() -> PathBuf {
    PathBuf::from("ycmd")
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_keepalive_secs() -> u64 {
    30
}

fn default_startup_timeout_ms() -> u64 {
    3000
}

/// Configuration for a [`ClientRuntime`](crate::runtime::ClientRuntime).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Command used to launch the completion server.
    #[serde(default = "default_server_command")]
    pub server_command: PathBuf,

    /// Extra arguments appended to the server command line.
    #[serde(default)]
    pub server_args: Vec<String>,

    /// Fallback extra-conf file handed to the server at startup.
    #[serde(default)]
    pub global_extra_conf: Option<PathBuf>,

    /// Glob patterns for extra-conf files the server may load unprompted.
    #[serde(default)]
    pub extra_conf_globlist: Vec<String>,

    /// Quiet period after the last edit before dirty buffers are pushed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Period of the health-probe keepalive timer.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// Wall-clock budget for the server to announce its listening endpoint.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_command: default_server_command(),
            server_args: Vec::new(),
            global_extra_conf: None,
            extra_conf_globlist: Vec::new(),
            debounce_ms: default_debounce_ms(),
            keepalive_secs: default_keepalive_secs(),
            startup_timeout_ms: default_startup_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Debounce quiet period as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Keepalive period as a [`Duration`].
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    /// Startup readiness budget as a [`Duration`].
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server_command, PathBuf::from("ycmd"));
        assert!(config.server_args.is_empty());
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.keepalive(), Duration::from_secs(30));
        assert_eq!(config.startup_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "server_command": "/opt/ycmd/run",
            "debounce_ms": 500
        }))
        .unwrap();
        assert_eq!(config.server_command, PathBuf::from("/opt/ycmd/run"));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.keepalive_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server_args": ["--log=debug"], "extra_conf_globlist": ["~/src/*"]}}"#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.server_args, vec!["--log=debug".to_string()]);
        assert_eq!(config.extra_conf_globlist, vec!["~/src/*".to_string()]);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = ClientConfig::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
