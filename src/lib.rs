//! ycmd-client
//!
//! An editor-side runtime that supervises a locally-spawned ycmd-compatible
//! code-completion server and mediates all communication with it on behalf
//! of an interactive text editor.
//!
//! # Overview
//!
//! This library provides:
//! - Supervision of the server child process, including shared-secret
//!   provisioning and readiness detection
//! - An authenticated, asynchronous HTTP request channel used for every
//!   exchange with the server
//! - A debouncing scheduler that decides when edited buffers are pushed
//!   for re-analysis, plus a keepalive that holds the server open
//! - A dispatcher that forwards decoded parse results to handlers the
//!   editor integration registers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  event hooks   ┌───────────────┐
//! │    Editor    │◄──────────────►│ ClientRuntime │
//! │ integration  │  annotations   └───────┬───────┘
//! └──────────────┘                        │
//!                        ┌───────────────┼────────────────┐
//!                 ┌──────▼──────┐ ┌──────▼───────┐ ┌──────▼─────┐
//!                 │  Scheduler  │ │RequestChannel│ │ Dispatcher │
//!                 └─────────────┘ └──────┬───────┘ └────────────┘
//!                                        │ signed HTTP
//!                                 ┌──────▼───────┐
//!                                 │  Supervisor  │──spawns──► completion
//!                                 └──────────────┘            server
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ycmd_client::{ClientConfig, ClientRuntime, DocumentContext};
//!
//! #[tokio::main]
//! async fn main() -> ycmd_client::Result<()> {
//!     let runtime = ClientRuntime::new(ClientConfig::default());
//!
//!     runtime
//!         .on_document_opened("/p/main.rs".as_ref(), "rust-mode", "fn main() {}")
//!         .await;
//!
//!     let ctx = DocumentContext {
//!         filepath: "/p/main.rs".into(),
//!         contents: "fn main() {}".to_string(),
//!         filetypes: vec!["rust".to_string()],
//!         line_num: 1,
//!         column_num: 4,
//!     };
//!     let completions = runtime.request_completions(&ctx).await?;
//!     println!("{} candidates", completions.completions.len());
//!
//!     runtime.close_session().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are too strict
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod runtime;
pub mod scheduler;
pub mod session;

// Re-export commonly used types at the crate root
pub use config::ClientConfig;
pub use dispatch::{Annotation, AnnotationKind, AnnotationSink};
pub use error::{Error, Result};
pub use protocol::wire::{
    CompletionItem, CompletionList, DiagnosticKind, DocumentContext, FileLocation, ParseResultItem,
};
pub use runtime::ClientRuntime;
