//! The client runtime: the surface the editor integration talks to.
//!
//! One `ClientRuntime` owns the whole stack — supervisor, request channel,
//! scheduler, dispatcher — as one explicit context object with an
//! init/teardown lifecycle matching `open_session`/`close_session`. Editor
//! event hooks arrive through the `on_document_*` methods; direct user
//! commands (completions, navigation) bypass the scheduler and hit the
//! channel directly.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::dispatch::{AnnotationSink, ResultDispatcher};
use crate::error::Result;
use crate::protocol::channel::RequestChannel;
use crate::protocol::paths;
use crate::protocol::wire::{
    BufferRequest, CompletionList, DocumentContext, FileLocation, GoToResponse, ParseResultItem,
};
use crate::scheduler::{DocumentRegistry, NotificationScheduler};
use crate::session::ServerSupervisor;

/// Builder for a [`ClientRuntime`].
#[derive(Debug, Default)]
pub struct ClientRuntimeBuilder {
    config: ClientConfig,
}

impl ClientRuntimeBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Wires up the runtime. Nothing is spawned until a session opens or
    /// the first request arrives.
    pub fn build(self) -> ClientRuntime {
        let supervisor = Arc::new(Mutex::new(ServerSupervisor::new(self.config.clone())));
        let channel = Arc::new(RequestChannel::new(Arc::clone(&supervisor)));
        let registry = Arc::new(Mutex::new(DocumentRegistry::default()));
        let dispatcher = Arc::new(ResultDispatcher::new());
        let scheduler = Arc::new(NotificationScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&channel),
            Arc::clone(&dispatcher),
            &self.config,
        ));

        ClientRuntime {
            supervisor,
            channel,
            registry,
            dispatcher,
            scheduler,
        }
    }
}

/// Supervises one completion server and mediates all exchanges with it.
pub struct ClientRuntime {
    supervisor: Arc<Mutex<ServerSupervisor>>,
    channel: Arc<RequestChannel>,
    registry: Arc<Mutex<DocumentRegistry>>,
    dispatcher: Arc<ResultDispatcher>,
    scheduler: Arc<NotificationScheduler>,
}

impl ClientRuntime {
    /// Creates a builder.
    pub fn builder() -> ClientRuntimeBuilder {
        ClientRuntimeBuilder::new()
    }

    /// Creates a runtime with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Starts the server session and the keepalive timer.
    ///
    /// Tears down any prior session first. A startup timeout is fatal and
    /// surfaced to the caller; it is not retried here.
    ///
    /// ## Errors
    /// `Error::Session` when the server cannot be started.
    pub async fn open_session(&self) -> Result<()> {
        self.supervisor.lock().await.start().await?;
        Arc::clone(&self.scheduler).start_keepalive().await;
        Ok(())
    }

    /// Cancels all timers and terminates the server session.
    ///
    /// In-flight requests are abandoned: they fail or orphan, which is the
    /// only cancellation primitive this runtime has.
    pub async fn close_session(&self) {
        self.scheduler.cancel_timers().await;
        self.supervisor.lock().await.stop().await;
    }

    /// Whether the supervised server process is alive.
    pub async fn is_running(&self) -> bool {
        self.supervisor.lock().await.is_running()
    }

    /// Registers an annotation sink with the dispatcher.
    pub fn register_annotation_sink(&self, sink: Box<dyn AnnotationSink>) {
        self.dispatcher.register(sink);
    }

    /// Requests completion candidates at the context's cursor.
    ///
    /// ## Errors
    /// `Error::Request` per exchange; the session stays alive.
    pub async fn request_completions(&self, ctx: &DocumentContext) -> Result<CompletionList> {
        let request = BufferRequest::from_context(ctx);
        Ok(self.channel.post(paths::COMPLETIONS, &request).await?)
    }

    /// Resolves the definition of the symbol at the context's cursor.
    ///
    /// Returns `None` when the server has no target to offer.
    ///
    /// ## Errors
    /// `Error::Request` per exchange.
    pub async fn request_goto(&self, ctx: &DocumentContext) -> Result<Option<FileLocation>> {
        let request = BufferRequest::from_context(ctx).with_command(["GoTo"]);
        let response: GoToResponse = self
            .channel
            .post(paths::RUN_COMPLETER_COMMAND, &request)
            .await?;
        Ok(response.into_first())
    }

    /// Pushes one document for re-analysis, bypassing the debounce.
    ///
    /// On success the document's dirty flag is cleared and the results are
    /// both dispatched to registered sinks and returned.
    ///
    /// ## Errors
    /// `Error::Request` per exchange; the dirty flag stays set on failure.
    pub async fn notify_document_changed(
        &self,
        ctx: &DocumentContext,
    ) -> Result<Vec<ParseResultItem>> {
        Ok(self.scheduler.sync_document(ctx).await?)
    }

    /// Tells the server to trust and load an extra-conf file.
    ///
    /// ## Errors
    /// `Error::Request` per exchange.
    pub async fn load_extra_config(&self, path: &Path) -> Result<()> {
        let body = serde_json::json!({ "filepath": path });
        self.channel.post_raw(paths::LOAD_EXTRA_CONF, &body).await?;
        Ok(())
    }

    /// Editor hook: a document was opened.
    ///
    /// Documents whose editor mode has no filetype classification are
    /// ignored — they are never scheduled and never cause the server to be
    /// started on their account.
    pub async fn on_document_opened(&self, path: &Path, editor_mode: &str, contents: &str) {
        let qualifies = self.registry.lock().await.open(path, editor_mode, contents);
        if qualifies {
            Arc::clone(&self.scheduler).rearm_debounce().await;
        }
    }

    /// Editor hook: a document's buffer changed.
    pub async fn on_document_edited(
        &self,
        path: &Path,
        contents: &str,
        line_num: u32,
        column_num: u32,
    ) {
        let qualifies = self
            .registry
            .lock()
            .await
            .edit(path, contents, line_num, column_num);
        if qualifies {
            Arc::clone(&self.scheduler).rearm_debounce().await;
        }
    }

    /// Editor hook: a document was closed.
    pub async fn on_document_closed(&self, path: &Path) {
        self.registry.lock().await.close(path);
    }
}
