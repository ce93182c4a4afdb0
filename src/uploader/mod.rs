//! Upload engine split into focused submodules.
//!
//! - [`task`] - The per-job upload contract and its implementations
//! - [`pool`] - Bounded worker pool yielding outcomes in completion order
//! - [`report`] - Done/error aggregation and timestamps
//! - [`control`] - Run lifecycle: start, stop, completion signalling

mod control;
mod pool;
mod report;
mod task;


pub use control::RunHandle;
pub use pool::{PoolRun, WorkerPool};
pub use report::RunReport;
pub use task::{HttpUploadTask, ScriptedUploadTask, UploadTask};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::channel::ResultChannel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Job, RunState};

/// Uploads a fixed list of files and reports progress through a [`ResultChannel`].
///
/// A coordinator is single-use: it moves from `Created` to `Running` on
/// [`start`](Self::start) and ends as `Completed` or `Terminated`. Progress events
/// are pushed to the channel as uploads finish; the aggregated [`RunReport`] is
/// available from the accessors once the run is over.
///
/// The upload implementation is injected through `T`; [`UploadCoordinator::new`]
/// uses the HTTP implementation built from [`Config`].
pub struct UploadCoordinator<T = HttpUploadTask> {
    /// Files to upload, in submission order
    jobs: Vec<Job>,
    /// Maximum number of uploads in flight
    num_workers: usize,
    /// Caller-owned progress channel
    channel: ResultChannel,
    /// Upload implementation shared by all workers
    task: Arc<T>,
    /// Results aggregated by the control loop
    report: RunReport,
    /// Cooperative stop request, observed between outcomes
    stop_token: CancellationToken,
    /// Published lifecycle state (observable through [`RunHandle`])
    state_tx: tokio::sync::watch::Sender<RunState>,
}

impl UploadCoordinator<HttpUploadTask> {
    /// Create a coordinator that uploads over HTTP as described by `config`
    pub fn new(
        config: &Config,
        jobs: impl IntoIterator<Item = impl Into<Job>>,
        channel: ResultChannel,
    ) -> Result<Self> {
        config.validate()?;
        let task = HttpUploadTask::new(config)?;
        Self::with_task(jobs, config.num_workers, channel, task)
    }
}

impl<T: UploadTask + 'static> UploadCoordinator<T> {
    /// Create a coordinator with an explicit upload implementation
    ///
    /// Repeated paths are uploaded once; the first occurrence keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `num_workers` is 0.
    pub fn with_task(
        jobs: impl IntoIterator<Item = impl Into<Job>>,
        num_workers: usize,
        channel: ResultChannel,
        task: T,
    ) -> Result<Self> {
        if num_workers == 0 {
            return Err(Error::config("num_workers", "must be at least 1"));
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        let mut duplicates = 0usize;
        for job in jobs.into_iter().map(Into::<Job>::into) {
            if seen.insert(job.clone()) {
                unique.push(job);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::debug!(duplicates, "Dropped repeated upload jobs");
        }

        let (state_tx, _state_rx) = tokio::sync::watch::channel(RunState::Created);

        Ok(Self {
            jobs: unique,
            num_workers,
            channel,
            task: Arc::new(task),
            report: RunReport::default(),
            stop_token: CancellationToken::new(),
            state_tx,
        })
    }
}

impl<T> UploadCoordinator<T> {
    /// Files this coordinator uploads, without repeats
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Maximum number of concurrent uploads
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// The progress channel events are pushed to
    pub fn channel(&self) -> &ResultChannel {
        &self.channel
    }

    /// Aggregated results so far
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Failed jobs and their status codes
    pub fn errors(&self) -> &HashMap<Job, u16> {
        self.report.errors()
    }

    /// Number of successful uploads
    pub fn done_count(&self) -> usize {
        self.report.done_count()
    }

    /// Number of jobs processed (successful or not)
    pub fn processed(&self) -> usize {
        self.report.processed()
    }

    /// Run duration in seconds; 0 before the run ends
    pub fn elapsed_seconds(&self) -> f64 {
        self.report.elapsed_seconds()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    /// Whether the run has completed or been terminated
    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Whether the progress channel still holds undrained events
    ///
    /// This says nothing about whether uploads are still running; combine it with
    /// [`is_finished`](Self::is_finished) or [`RunHandle::is_finished`] before
    /// deciding that every event was consumed.
    pub fn is_active(&self) -> bool {
        !self.channel.is_empty()
    }

    /// One-line human-readable summary of the run
    pub fn summary(&self) -> String {
        self.to_string()
    }

    fn set_state(&self, state: RunState) {
        self.state_tx.send_replace(state);
    }
}

impl<T> std::fmt::Display for UploadCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "upload run [{}] - files: {}, done: {}, errors: {}, elapsed: {:.3} sec",
            self.state(),
            self.jobs.len(),
            self.report.done_count(),
            self.report.errors().len(),
            self.report.elapsed_seconds()
        )
    }
}

impl<T> std::fmt::Debug for UploadCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCoordinator")
            .field("jobs", &self.jobs.len())
            .field("num_workers", &self.num_workers)
            .field("state", &self.state())
            .field("report", &self.report)
            .finish()
    }
}
