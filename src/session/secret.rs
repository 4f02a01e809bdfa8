//! Shared-secret generation and startup descriptor serialization.
//!
//! Every server start mints a fresh 16-byte secret and writes it, together
//! with the behavioral settings the server expects, into a uniquely-named
//! transient JSON file. The server reads that file once on boot and deletes
//! it; the secret then lives only in the two processes' memory.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;

use crate::config::ClientConfig;

/// Length of the shared secret in bytes.
pub const SECRET_LEN: usize = 16;

/// Generates a fresh shared secret.
///
/// The secret only needs to be unpredictable enough that a local attacker
/// cannot guess it before the server consumes the descriptor.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    rand::random()
}

/// The one-shot settings blob the server consumes at startup.
///
/// Three fields vary per session (the secret and the extra-conf trust
/// settings); the rest is a fixed behavioral template. The filetype maps
/// must always serialize as JSON objects — the server's settings parser
/// rejects `null` where it expects an object.
#[derive(Debug, Serialize)]
pub struct StartupDescriptor {
    hmac_secret: String,
    global_ycm_extra_conf: String,
    extra_conf_globlist: Vec<String>,
    confirm_extra_conf: u8,
    auto_trigger: u8,
    min_num_of_chars_for_completion: u32,
    min_num_identifier_candidate_chars: u32,
    max_num_candidates: u32,
    max_num_identifier_candidates: u32,
    max_diagnostics_to_display: u32,
    complete_in_comments: u8,
    complete_in_strings: u8,
    collect_identifiers_from_comments_and_strings: u8,
    collect_identifiers_from_tags_files: u8,
    seed_identifiers_with_syntax: u8,
    server_keep_logfiles: u8,
    /// Filetype tags the server will serve, `*` meaning all.
    filetype_whitelist: BTreeMap<String, u8>,
    /// Filetype tags the server must ignore even when whitelisted.
    filetype_blacklist: BTreeMap<String, u8>,
}

impl StartupDescriptor {
    /// Builds a descriptor for one server start.
    pub fn new(secret: &[u8], config: &ClientConfig) -> Self {
        Self {
            hmac_secret: STANDARD.encode(secret),
            global_ycm_extra_conf: config
                .global_extra_conf
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            extra_conf_globlist: config.extra_conf_globlist.clone(),
            confirm_extra_conf: 1,
            auto_trigger: 1,
            min_num_of_chars_for_completion: 2,
            min_num_identifier_candidate_chars: 0,
            max_num_candidates: 50,
            max_num_identifier_candidates: 10,
            max_diagnostics_to_display: 30,
            complete_in_comments: 0,
            complete_in_strings: 1,
            collect_identifiers_from_comments_and_strings: 0,
            collect_identifiers_from_tags_files: 0,
            seed_identifiers_with_syntax: 0,
            server_keep_logfiles: 0,
            filetype_whitelist: BTreeMap::from([("*".to_string(), 1)]),
            filetype_blacklist: ["tagbar", "qf", "notes", "netrw", "unite", "infolog"]
                .into_iter()
                .map(|tag| (tag.to_string(), 1))
                .collect(),
        }
    }
}

/// Generates a secret and writes the matching descriptor file.
///
/// The file is created with a unique name and owner-only permissions, then
/// persisted so the server can read and delete it. If the server never
/// starts, the file is orphaned; callers tolerate that and clean up on a
/// best-effort basis.
///
/// ## Errors
/// Returns an error if the descriptor cannot be serialized or written.
pub fn provision(config: &ClientConfig) -> io::Result<(Vec<u8>, PathBuf)> {
    let secret = generate_secret();
    let descriptor = StartupDescriptor::new(&secret, config);

    let file = tempfile::Builder::new()
        .prefix("ycmd_settings_")
        .suffix(".json")
        .tempfile()?;
    serde_json::to_writer(file.as_file(), &descriptor).map_err(io::Error::other)?;
    let (_file, path) = file.keep().map_err(|e| e.error)?;

    Ok((secret.to_vec(), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_has_fixed_length() {
        assert_eq!(generate_secret().len(), SECRET_LEN);
    }

    #[test]
    fn test_consecutive_secrets_differ() {
        let mut previous = generate_secret();
        for _ in 0..32 {
            let next = generate_secret();
            assert_ne!(previous, next);
            previous = next;
        }
    }

    #[test]
    fn test_descriptor_secret_round_trips() {
        let secret = [0xAB; SECRET_LEN];
        let descriptor = StartupDescriptor::new(&secret, &ClientConfig::default());
        let decoded = STANDARD.decode(&descriptor.hmac_secret).unwrap();
        assert_eq!(decoded, secret);
    }

    #[test]
    fn test_empty_maps_serialize_as_objects() {
        let mut descriptor = StartupDescriptor::new(&[0x01; SECRET_LEN], &ClientConfig::default());
        descriptor.filetype_whitelist.clear();
        descriptor.filetype_blacklist.clear();

        let value = serde_json::to_value(&descriptor).unwrap();
        assert!(value["filetype_whitelist"].is_object());
        assert!(value["filetype_blacklist"].is_object());
        assert_eq!(value["filetype_whitelist"], serde_json::json!({}));
        assert_eq!(value["extra_conf_globlist"], serde_json::json!([]));
    }

    #[test]
    fn test_unset_extra_conf_is_empty_string_not_null() {
        let descriptor = StartupDescriptor::new(&[0x01; SECRET_LEN], &ClientConfig::default());
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["global_ycm_extra_conf"], serde_json::json!(""));
    }

    #[test]
    fn test_provision_writes_readable_descriptor() {
        let (secret, path) = provision(&ClientConfig::default()).unwrap();
        assert_eq!(secret.len(), SECRET_LEN);

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let encoded = value["hmac_secret"].as_str().unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), secret);

        std::fs::remove_file(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_provision_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_secret, path) = provision(&ClientConfig::default()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::remove_file(&path).unwrap();
    }
}
