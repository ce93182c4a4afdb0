//! Core types for batch-uploader

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::UploadError;

/// HTTP status code treated as a successful upload
pub const SUCCESS_CODE: u16 = 200;

/// A single file to upload, identified by its path
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(PathBuf);

impl Job {
    /// Create a new Job
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Path of the file to upload
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Final path component, used as the multipart field name
    pub fn file_name(&self) -> Option<String> {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

impl From<&str> for Job {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<String> for Job {
    fn from(path: String) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<PathBuf> for Job {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for Job {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Terminal result of attempting one job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// The job this outcome belongs to
    pub job: Job,
    /// Status code (200 = uploaded)
    pub code: u16,
    /// Status text accompanying the code
    pub reason: String,
}

impl Outcome {
    /// Create a new Outcome
    pub fn new(job: Job, code: u16, reason: impl Into<String>) -> Self {
        Self {
            job,
            code,
            reason: reason.into(),
        }
    }

    /// Build the failure outcome for a job from an upload error
    pub fn from_error(job: Job, error: &UploadError) -> Self {
        Self {
            job,
            code: error.code(),
            reason: error.reason(),
        }
    }

    /// Whether the upload succeeded
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Progress notification pushed to the result channel, one per processed job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// File uploaded
    Done {
        /// The uploaded job
        job: Job,
        /// Status text from the endpoint
        status: String,
    },

    /// File not uploaded
    Error {
        /// The failed job
        job: Job,
        /// Failure description
        error: String,
    },
}

impl ProgressEvent {
    /// The job this event reports on
    pub fn job(&self) -> &Job {
        match self {
            ProgressEvent::Done { job, .. } | ProgressEvent::Error { job, .. } => job,
        }
    }

    /// Whether this event reports a successful upload
    pub fn is_done(&self) -> bool {
        matches!(self, ProgressEvent::Done { .. })
    }
}

impl From<Outcome> for ProgressEvent {
    fn from(outcome: Outcome) -> Self {
        if outcome.is_success() {
            ProgressEvent::Done {
                job: outcome.job,
                status: outcome.reason,
            }
        } else {
            ProgressEvent::Error {
                job: outcome.job,
                error: outcome.reason,
            }
        }
    }
}

/// Lifecycle state of an upload run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Constructed, `start()` not yet called
    Created,
    /// Jobs are being dispatched
    Running,
    /// Every job was processed
    Completed,
    /// Stopped early via `stop()`
    Terminated,
}

impl RunState {
    /// Whether the run has ended (completed or terminated)
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Terminated)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Created => "created",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// How a call to `start()` ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// All jobs were processed
    Completed,
    /// The pool was terminated after a stop request
    Terminated,
}

impl From<RunOutcome> for RunState {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Terminated => RunState::Terminated,
        }
    }
}
