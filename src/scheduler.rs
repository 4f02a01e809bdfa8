//! Buffer-change scheduling.
//!
//! The editor reports opens, edits, and closes; this module decides when
//! the server gets told. Edits mark a document dirty and restart the
//! debounce countdown; when the quiet period elapses, every dirty document
//! with a classified filetype is pushed as a parse notification. The dirty
//! flag is cleared only after a successful round trip, so edits landing
//! mid-flight simply keep the document dirty and coalesce into the next
//! push. A separate keepalive timer pings the health endpoint so the
//! server's idle-suicide timeout never fires during quiet periods.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatch::ResultDispatcher;
use crate::protocol::channel::RequestChannel;
use crate::protocol::wire::{BufferRequest, DocumentContext, FILE_READY_TO_PARSE, ParseResultItem};
use crate::protocol::{RequestResult, paths};

/// Maps an editor mode to the server's filetype tag.
///
/// Documents whose mode has no entry are never registered, never
/// scheduled, and never cause the server to be auto-started.
pub fn filetype_for_mode(mode: &str) -> Option<&'static str> {
    match mode {
        "rust-mode" | "rust" => Some("rust"),
        "python-mode" | "python" => Some("python"),
        "c-mode" | "c" => Some("c"),
        "c++-mode" | "cpp" => Some("cpp"),
        "js-mode" | "javascript" => Some("javascript"),
        "typescript-mode" | "typescript" => Some("typescript"),
        "go-mode" | "go" => Some("go"),
        "java-mode" | "java" => Some("java"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct DocumentState {
    filetype: String,
    dirty: bool,
    contents: String,
    line_num: u32,
    column_num: u32,
}

/// Tracks every open, classified document and its dirty flag.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: HashMap<PathBuf, DocumentState>,
}

impl DocumentRegistry {
    /// Registers a newly opened document.
    ///
    /// Returns `false` when the editor mode has no filetype classification;
    /// such documents are ignored entirely.
    pub fn open(&mut self, path: &Path, editor_mode: &str, contents: &str) -> bool {
        let Some(filetype) = filetype_for_mode(editor_mode) else {
            debug!(path = %path.display(), editor_mode, "unclassified document, not tracking");
            return false;
        };
        self.docs.insert(
            path.to_path_buf(),
            DocumentState {
                filetype: filetype.to_string(),
                dirty: true,
                contents: contents.to_string(),
                line_num: 1,
                column_num: 1,
            },
        );
        true
    }

    /// Records an edit. Returns `true` when the edit qualifies for
    /// scheduling (the document is open and classified).
    pub fn edit(&mut self, path: &Path, contents: &str, line_num: u32, column_num: u32) -> bool {
        match self.docs.get_mut(path) {
            Some(state) => {
                state.contents = contents.to_string();
                state.line_num = line_num;
                state.column_num = column_num;
                state.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Forgets a document.
    pub fn close(&mut self, path: &Path) {
        self.docs.remove(path);
    }

    /// Clears the dirty flag after a successful round trip.
    pub fn clear_dirty(&mut self, path: &Path) {
        if let Some(state) = self.docs.get_mut(path) {
            state.dirty = false;
        }
    }

    /// Whether the document is currently open and tracked.
    pub fn is_open(&self, path: &Path) -> bool {
        self.docs.contains_key(path)
    }

    /// Snapshots of every dirty document, ready to push.
    pub fn dirty_contexts(&self) -> Vec<DocumentContext> {
        self.docs
            .iter()
            .filter(|(_, state)| state.dirty)
            .map(|(path, state)| DocumentContext {
                filepath: path.clone(),
                contents: state.contents.clone(),
                filetypes: vec![state.filetype.clone()],
                line_num: state.line_num,
                column_num: state.column_num,
            })
            .collect()
    }

    /// Paths of every tracked document.
    pub fn open_paths(&self) -> HashSet<PathBuf> {
        self.docs.keys().cloned().collect()
    }
}

/// Debounce and keepalive timing for one runtime.
///
/// Both timers are process-wide singletons with an explicit lifecycle:
/// the stale handle is always aborted before a replacement is spawned,
/// and both are cancelled on session close.
pub struct NotificationScheduler {
    registry: Arc<Mutex<DocumentRegistry>>,
    channel: Arc<RequestChannel>,
    dispatcher: Arc<ResultDispatcher>,
    debounce: Duration,
    keepalive: Duration,
    debounce_handle: Mutex<Option<JoinHandle<()>>>,
    keepalive_handle: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationScheduler {
    /// Creates a scheduler over the shared registry, channel, and
    /// dispatcher.
    pub fn new(
        registry: Arc<Mutex<DocumentRegistry>>,
        channel: Arc<RequestChannel>,
        dispatcher: Arc<ResultDispatcher>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            registry,
            channel,
            dispatcher,
            debounce: config.debounce(),
            keepalive: config.keepalive(),
            debounce_handle: Mutex::new(None),
            keepalive_handle: Mutex::new(None),
        }
    }

    /// Restarts the debounce countdown after a qualifying edit.
    pub async fn rearm_debounce(self: Arc<Self>) {
        let mut guard = self.debounce_handle.lock().await;
        if let Some(stale) = guard.take() {
            stale.abort();
        }
        let scheduler = Arc::clone(&self);
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(scheduler.debounce).await;
            scheduler.sync_dirty().await;
        }));
    }

    /// Starts the keepalive timer, replacing any running one.
    pub async fn start_keepalive(self: Arc<Self>) {
        let mut guard = self.keepalive_handle.lock().await;
        if let Some(stale) = guard.take() {
            stale.abort();
        }
        let scheduler = Arc::clone(&self);
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(scheduler.keepalive).await;
                if let Err(e) = scheduler.channel.health_check().await {
                    debug!(error = %e, "keepalive probe failed");
                }
            }
        }));
    }

    /// Cancels both timers. Called on session close.
    pub async fn cancel_timers(&self) {
        if let Some(handle) = self.debounce_handle.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.keepalive_handle.lock().await.take() {
            handle.abort();
        }
    }

    /// Pushes every dirty document, swallowing per-document failures.
    ///
    /// A failed push leaves the dirty flag set; the document goes out again
    /// on the next firing.
    pub async fn sync_dirty(&self) {
        let contexts = self.registry.lock().await.dirty_contexts();
        for ctx in contexts {
            if let Err(e) = self.sync_document(&ctx).await {
                warn!(path = %ctx.filepath.display(), error = %e, "parse notification failed");
            }
        }
    }

    /// Pushes one document and routes the parse results.
    ///
    /// On success the document's dirty flag is cleared and the decoded
    /// result list goes to the dispatcher before being returned.
    ///
    /// ## Errors
    /// Whatever the request channel produces; the dirty flag stays set.
    pub async fn sync_document(
        &self,
        ctx: &DocumentContext,
    ) -> RequestResult<Vec<ParseResultItem>> {
        let request = BufferRequest::from_context(ctx).with_event(FILE_READY_TO_PARSE);
        let items: Vec<ParseResultItem> =
            self.channel.post(paths::EVENT_NOTIFICATION, &request).await?;

        let open_paths = {
            let mut registry = self.registry.lock().await;
            registry.clear_dirty(&ctx.filepath);
            registry.open_paths()
        };
        self.dispatcher.dispatch(&ctx.filepath, &items, &open_paths);

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filetype_table() {
        assert_eq!(filetype_for_mode("rust-mode"), Some("rust"));
        assert_eq!(filetype_for_mode("c++-mode"), Some("cpp"));
        assert_eq!(filetype_for_mode("fundamental-mode"), None);
    }

    #[test]
    fn test_open_classified_document_starts_dirty() {
        let mut registry = DocumentRegistry::default();
        assert!(registry.open(Path::new("/p/main.rs"), "rust-mode", "fn main() {}"));

        let dirty = registry.dirty_contexts();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].filetypes, vec!["rust".to_string()]);
    }

    #[test]
    fn test_unclassified_document_is_never_tracked() {
        let mut registry = DocumentRegistry::default();
        assert!(!registry.open(Path::new("/p/notes.txt"), "text-mode", "notes"));

        // Repeated edits of an untracked document never qualify either.
        for _ in 0..5 {
            assert!(!registry.edit(Path::new("/p/notes.txt"), "more notes", 1, 1));
        }
        assert!(registry.dirty_contexts().is_empty());
        assert!(!registry.is_open(Path::new("/p/notes.txt")));
    }

    #[test]
    fn test_clean_document_is_not_pushed() {
        let mut registry = DocumentRegistry::default();
        registry.open(Path::new("/p/main.rs"), "rust-mode", "fn main() {}");
        registry.edit(Path::new("/p/main.rs"), "fn main() { }", 1, 12);

        // A round trip completes before the debounce fires: nothing left
        // to push afterwards.
        registry.clear_dirty(Path::new("/p/main.rs"));
        assert!(registry.dirty_contexts().is_empty());
    }

    #[test]
    fn test_edit_after_clear_marks_dirty_again() {
        let mut registry = DocumentRegistry::default();
        registry.open(Path::new("/p/main.rs"), "rust-mode", "v1");
        registry.clear_dirty(Path::new("/p/main.rs"));

        assert!(registry.edit(Path::new("/p/main.rs"), "v2", 2, 3));
        let dirty = registry.dirty_contexts();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].contents, "v2");
        assert_eq!(dirty[0].line_num, 2);
        assert_eq!(dirty[0].column_num, 3);
    }

    #[test]
    fn test_close_forgets_document() {
        let mut registry = DocumentRegistry::default();
        registry.open(Path::new("/p/main.rs"), "rust-mode", "fn main() {}");
        registry.close(Path::new("/p/main.rs"));

        assert!(!registry.is_open(Path::new("/p/main.rs")));
        assert!(registry.dirty_contexts().is_empty());
    }

    #[test]
    fn test_open_paths_lists_all_tracked() {
        let mut registry = DocumentRegistry::default();
        registry.open(Path::new("/p/a.rs"), "rust-mode", "");
        registry.open(Path::new("/p/b.py"), "python-mode", "");
        registry.clear_dirty(Path::new("/p/a.rs"));

        let open = registry.open_paths();
        assert_eq!(open.len(), 2);
        assert!(open.contains(Path::new("/p/a.rs")));
    }
}
