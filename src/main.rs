//! ycmd-client — entry point.
//!
//! A one-shot driver for the library: spawns the completion server, pushes
//! a single file for analysis, prints the parse results, and tears the
//! session down. Useful for checking a server installation and for
//! debugging the client outside an editor.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ycmd_client::{Annotation, AnnotationSink, ClientConfig, ClientRuntime, DocumentContext};

/// Run one file through a ycmd-compatible completion server.
#[derive(Parser, Debug)]
#[command(name = "ycmd-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to analyze.
    file: PathBuf,

    /// Command used to launch the completion server.
    #[arg(short, long, default_value = "ycmd")]
    server: PathBuf,

    /// Extra arguments passed to the server.
    #[arg(long)]
    server_arg: Vec<String>,

    /// Editor mode used for filetype classification (derived from the file
    /// extension when omitted).
    #[arg(short, long)]
    mode: Option<String>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    /// Parses the log level string into a tracing Level.
    fn parse_log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!("invalid log level: {}", other),
        }
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ycmd_client={level}")));

    // Logs go to stderr; stdout carries the analysis results.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

/// Guesses an editor mode from the file extension.
fn mode_for_file(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|ext| ext.to_str())? {
        "rs" => Some("rust-mode"),
        "py" => Some("python-mode"),
        "c" => Some("c-mode"),
        "cpp" | "cc" | "cxx" => Some("c++-mode"),
        "js" => Some("js-mode"),
        "ts" => Some("typescript-mode"),
        "go" => Some("go-mode"),
        "java" => Some("java-mode"),
        _ => None,
    }
}

/// Prints annotations to stdout as they are dispatched.
struct PrintSink;

impl AnnotationSink for PrintSink {
    fn clear(&self, _path: &Path) {}

    fn annotate(&self, annotation: &Annotation) {
        println!(
            "{}:{}: {:?}: {}",
            annotation.filepath.display(),
            annotation.line_num,
            annotation.kind,
            annotation.message
        );
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.parse_log_level()?)?;

    let file = args
        .file
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", args.file.display()))?;
    let mode = match args.mode.as_deref() {
        Some(mode) => mode.to_string(),
        None => mode_for_file(&file)
            .context("cannot classify file; pass --mode explicitly")?
            .to_string(),
    };
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let config = ClientConfig {
        server_command: args.server,
        server_args: args.server_arg,
        ..ClientConfig::default()
    };
    let runtime = ClientRuntime::new(config);
    runtime.register_annotation_sink(Box::new(PrintSink));

    info!(file = %file.display(), %mode, "starting completion server");
    runtime
        .open_session()
        .await
        .context("failed to start completion server")?;

    runtime.on_document_opened(&file, &mode, &contents).await;

    let ctx = DocumentContext {
        filepath: file.clone(),
        contents,
        filetypes: vec![mode_to_filetype(&mode)?],
        line_num: 1,
        column_num: 1,
    };
    let items = runtime
        .notify_document_changed(&ctx)
        .await
        .context("parse notification failed")?;

    let errors = items.iter().filter(|item| item.kind.is_error()).count();
    info!(total = items.len(), errors, "analysis finished");

    runtime.close_session().await;

    Ok(if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Resolves the server filetype tag for an editor mode.
fn mode_to_filetype(mode: &str) -> Result<String> {
    ycmd_client::scheduler::filetype_for_mode(mode)
        .map(ToString::to_string)
        .with_context(|| format!("no filetype classification for mode '{mode}'"))
}
