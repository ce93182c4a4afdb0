//! # batch-uploader
//!
//! Concurrent batch file uploader with live progress reporting.
//!
//! ## Design Philosophy
//!
//! batch-uploader is designed to be:
//! - **Bounded** - At most `num_workers` uploads are in flight at any time
//! - **Streaming** - Each result is reported the moment its upload finishes
//! - **Pluggable** - The per-file upload is an injected [`UploadTask`]
//! - **Cooperative** - A run can be stopped from any task between two results
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_uploader::{Config, ResultChannel, UploadCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         endpoint_url: "https://files.example.com/upload".to_string(),
//!         num_workers: 4,
//!         ..Default::default()
//!     };
//!
//!     let channel = ResultChannel::new();
//!     let mut uploader =
//!         UploadCoordinator::new(&config, ["report.csv", "photo.jpg"], channel.clone())?;
//!     let handle = uploader.handle();
//!
//!     // Drain progress while the run is going
//!     let consumer = tokio::spawn(async move {
//!         while let Some(event) = handle.next_event(&channel).await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     uploader.start().await?;
//!     consumer.await?;
//!     println!("{}", uploader.summary());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Progress channel
pub mod channel;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core types and events
pub mod types;
/// Upload engine: tasks, worker pool, coordinator
pub mod uploader;

// Re-export commonly used types
pub use channel::ResultChannel;
pub use config::Config;
pub use error::{Error, Result, UploadError};
pub use types::{Job, Outcome, ProgressEvent, RunOutcome, RunState};
pub use uploader::{
    HttpUploadTask, RunHandle, RunReport, ScriptedUploadTask, UploadCoordinator, UploadTask,
    WorkerPool,
};

/// Stop a run when the process receives a termination signal.
///
/// Resolves once the run has finished, either on its own or after the signal
/// triggered [`RunHandle::stop`], and returns the final state.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batch_uploader::{Config, ResultChannel, UploadCoordinator, stop_on_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut uploader =
///         UploadCoordinator::new(&Config::default(), ["a.bin"], ResultChannel::new())?;
///     tokio::spawn(stop_on_signal(uploader.handle()));
///     uploader.start().await?;
///     Ok(())
/// }
/// ```
pub async fn stop_on_signal(handle: RunHandle) -> RunState {
    tokio::select! {
        state = handle.wait_finished() => {
            return state;
        }
        _ = wait_for_signal() => {
            handle.stop();
        }
    }
    handle.wait_finished().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
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
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
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
