//! Result dispatch to registered handlers.
//!
//! The dispatcher owns no presentation. Decoded parse results are turned
//! into region annotations and fanned out to whatever sinks the editor
//! integration registered; completion lists and navigation targets bypass
//! this path entirely and go straight back to the caller that requested
//! them.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::protocol::wire::{DiagnosticKind, ParseResultItem};

/// Visual category of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Error region.
    Error,
    /// Warning region.
    Warning,
}

/// A region annotation derived from one parse result.
///
/// Spans the reported line and carries the message for on-demand display.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Document the annotation belongs to.
    pub filepath: PathBuf,
    /// 1-based line the region spans.
    pub line_num: u32,
    /// Visual category.
    pub kind: AnnotationKind,
    /// Message shown on demand.
    pub message: String,
}

/// External handler for dispatched annotations (decoration, display).
pub trait AnnotationSink: Send + Sync {
    /// Drops every annotation previously emitted for `path`.
    fn clear(&self, path: &Path);

    /// Emits one region annotation.
    fn annotate(&self, annotation: &Annotation);
}

fn visual_category(kind: DiagnosticKind) -> Option<AnnotationKind> {
    match kind {
        DiagnosticKind::Error => Some(AnnotationKind::Error),
        DiagnosticKind::Warning => Some(AnnotationKind::Warning),
        DiagnosticKind::Other => None,
    }
}

/// Fans decoded parse results out to registered sinks.
#[derive(Default)]
pub struct ResultDispatcher {
    sinks: RwLock<Vec<Box<dyn AnnotationSink>>>,
}

impl ResultDispatcher {
    /// Creates a dispatcher with no registered sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink. Sinks are invoked in registration order.
    pub fn register(&self, sink: Box<dyn AnnotationSink>) {
        self.sinks
            .write()
            .expect("sink registry lock poisoned")
            .push(sink);
    }

    /// Routes one notification's parse results.
    ///
    /// Clears prior decoration state for every affected open document
    /// (always including the document the notification was for), then
    /// emits one annotation per item with a known severity whose document
    /// is open. Items with unrecognized severities are silently skipped.
    pub fn dispatch(&self, origin: &Path, items: &[ParseResultItem], open_docs: &HashSet<PathBuf>) {
        let sinks = self.sinks.read().expect("sink registry lock poisoned");
        if sinks.is_empty() {
            return;
        }

        let mut affected: BTreeSet<&Path> = items
            .iter()
            .map(|item| item.location.filepath.as_path())
            .filter(|path| open_docs.contains(*path))
            .collect();
        if open_docs.contains(origin) {
            affected.insert(origin);
        }

        for path in &affected {
            for sink in sinks.iter() {
                sink.clear(path);
            }
        }

        for item in items {
            let Some(kind) = visual_category(item.kind) else {
                continue;
            };
            if !open_docs.contains(&item.location.filepath) {
                debug!(path = %item.location.filepath.display(), "result for closed document, skipping");
                continue;
            }
            let annotation = Annotation {
                filepath: item.location.filepath.clone(),
                line_num: item.location.line_num,
                kind,
                message: item.text.clone(),
            };
            for sink in sinks.iter() {
                sink.annotate(&annotation);
            }
        }
    }
}
