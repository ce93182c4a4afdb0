//! Error types for batch-uploader
//!
//! Two layers of errors live here:
//! - [`Error`] for crate-level failures (configuration, lifecycle misuse, I/O)
//! - [`UploadError`] for per-job failures, which never abort a run and are always
//!   folded into a failure [`Outcome`](crate::types::Outcome)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for batch-uploader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Status code reported when a job's local file cannot be read
pub const NOT_FOUND_CODE: u16 = 404;

/// Reason text reported when a job's local file cannot be read
pub const NOT_FOUND_REASON: &str = "not found";

/// Status code reported when an upload never produced an HTTP response
pub const NO_RESPONSE_CODE: u16 = 0;

/// Status code reported when a worker panicked while uploading
pub const WORKER_FAULT_CODE: u16 = 500;

/// Main error type for batch-uploader
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "num_workers")
        key: Option<String>,
    },

    /// `start()` was called on a coordinator that already ran
    #[error("upload run already started")]
    AlreadyStarted,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error (building the client, not per-job transfers)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single upload job
///
/// Produced inside an [`UploadTask`](crate::uploader::UploadTask) and converted to a
/// failure outcome before it leaves the worker.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The job's source file does not exist or cannot be read
    #[error("local file {} not found", .path.display())]
    LocalResourceMissing {
        /// Path of the missing file
        path: PathBuf,
    },

    /// The endpoint answered with a non-success status
    #[error("upload rejected with {code} {reason}")]
    TransportFailure {
        /// HTTP status code returned by the endpoint
        code: u16,
        /// Reason phrase returned by the endpoint
        reason: String,
    },

    /// The request could not complete (connection refused, DNS, timeout)
    #[error("transport error: {message}")]
    TransportException {
        /// Status code attached to the error, if the client saw one
        code: Option<u16>,
        /// Error description
        message: String,
    },

    /// The worker running the upload panicked or was cancelled by the runtime
    #[error("worker fault: {0}")]
    WorkerFault(String),
}

impl UploadError {
    /// Status code this failure is reported with
    pub fn code(&self) -> u16 {
        match self {
            UploadError::LocalResourceMissing { .. } => NOT_FOUND_CODE,
            UploadError::TransportFailure { code, .. } => *code,
            UploadError::TransportException { code, .. } => code.unwrap_or(NO_RESPONSE_CODE),
            UploadError::WorkerFault(_) => WORKER_FAULT_CODE,
        }
    }

    /// Reason text this failure is reported with
    pub fn reason(&self) -> String {
        match self {
            UploadError::LocalResourceMissing { .. } => NOT_FOUND_REASON.to_string(),
            UploadError::TransportFailure { reason, .. } => reason.clone(),
            UploadError::TransportException { message, .. } => message.clone(),
            UploadError::WorkerFault(_) => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::TransportException {
            code: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
