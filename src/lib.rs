//! # batchconv
//!
//! Concurrent batch image conversion service backed by ImageMagick.
//!
//! ## Design Philosophy
//!
//! batchconv is designed to be:
//! - **Per-request isolated** - Every batch owns its worker pool, scratch storage and cancellation
//! - **Failure tolerant** - One bad file never sinks the batch; failures are reported, not dropped
//! - **Deterministic** - Archive entries follow input order, whatever order conversions finish in
//! - **Embeddable** - The HTTP surface is a thin layer over [`ConversionService`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use batchconv::{Config, ConversionService};
//! use batchconv::types::{ConversionResponse, UploadedFile};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ConversionService::new(Config::default())?;
//!
//!     let files = vec![
//!         UploadedFile {
//!             file_name: "cat.png".to_string(),
//!             content: std::fs::read("cat.png")?.into(),
//!         },
//!         UploadedFile {
//!             file_name: "dog.bmp".to_string(),
//!             content: std::fs::read("dog.bmp")?.into(),
//!         },
//!     ];
//!
//!     match service
//!         .convert_files(files, Some(".jpg"), &CancellationToken::new())
//!         .await?
//!     {
//!         ConversionResponse::Single { file_name, bytes, .. } => std::fs::write(file_name, bytes)?,
//!         ConversionResponse::Archive { file_name, bytes, .. } => std::fs::write(file_name, bytes)?,
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// ZIP packaging of converted outputs
pub mod archive;
/// Response assembly from per-item results
pub mod assembler;
/// Configuration types
pub mod config;
/// Pluggable conversion backends
pub mod converter;
/// Error types
pub mod error;
/// Format catalog and file name helpers
pub mod formats;
/// Request validation and batch construction
pub mod intake;
/// Log subscriber setup
pub mod logging;
/// Bounded concurrent execution of a batch
pub mod orchestrator;
/// Top-level conversion service
pub mod service;
/// Per-item conversion state machine
pub mod task;
/// Scoped scratch storage
pub mod temp;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use converter::{CliConverter, Converter, UnavailableConverter};
pub use error::{
    ApiError, ConversionError, Error, ErrorDetail, ItemError, Result, ToHttpStatus,
};
pub use service::ConversionService;
pub use types::{
    BatchRequest, Capabilities, ConversionResponse, ConversionResult, FailedItem, ResultSet,
    UploadedFile,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Helper function to serve the API until a termination signal arrives.
///
/// Once a signal is received the shutdown token is cancelled: the listener stops
/// accepting connections and in-flight batches end with a 503 after their
/// scratch storage has been removed.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batchconv::{Config, ConversionService, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let service = ConversionService::new(config.clone())?;
///
///     // Serve with automatic signal handling
///     run_with_shutdown(service, config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: ConversionService, config: Config) -> Result<()> {
    let shutdown = CancellationToken::new();

    let mut server = tokio::spawn(api::start_api_server(
        Arc::new(service),
        Arc::new(config),
        shutdown.clone(),
    ));

    tokio::select! {
        _ = wait_for_signal() => {
            tracing::info!("Shutting down, cancelling in-flight conversions");
            shutdown.cancel();
        }
        // Server ended on its own (e.g. the address could not be bound)
        result = &mut server => return join_server(result),
    }

    join_server(server.await)
}

fn join_server(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    result.map_err(|e| Error::ApiServerError(format!("server task failed: {e}")))?
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
