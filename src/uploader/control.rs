//! Run lifecycle control: start, stop, and completion signalling.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::channel::ResultChannel;
use crate::error::{Error, Result};
use crate::types::{Outcome, ProgressEvent, RunOutcome, RunState};

use super::UploadCoordinator;
use super::pool::WorkerPool;
use super::task::UploadTask;

impl<T: UploadTask + 'static> UploadCoordinator<T> {
    /// Upload every job, pushing one progress event per processed job
    ///
    /// Outcomes are classified as they complete: `200` counts as done, anything
    /// else is recorded in [`errors`](Self::errors). After each outcome the stop
    /// flag is checked; if a stop was requested the pool is terminated, in-flight
    /// uploads are abandoned, and [`RunOutcome::Terminated`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if the coordinator already ran. Upload
    /// failures never surface here; they are part of the report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use batch_uploader::*;
    /// # async fn example() -> Result<()> {
    /// let channel = ResultChannel::new();
    /// let mut uploader = UploadCoordinator::new(
    ///     &Config::default(),
    ///     ["a.txt", "b.txt"],
    ///     channel.clone(),
    /// )?;
    /// uploader.start().await?;
    /// for event in channel.drain() {
    ///     println!("{event:?}");
    /// }
    /// println!("{}", uploader.summary());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&mut self) -> Result<RunOutcome> {
        if self.state() != RunState::Created {
            return Err(Error::AlreadyStarted);
        }

        self.report.mark_started();
        self.set_state(RunState::Running);
        tracing::info!(
            jobs = self.jobs.len(),
            workers = self.num_workers,
            "Starting upload run"
        );

        // Declared before the pool run so in-flight uploads are aborted first
        let mut guard = RunGuard {
            coordinator: self,
            finished: false,
        };
        let pool = WorkerPool::new(
            Arc::clone(&guard.coordinator.task),
            guard.coordinator.num_workers,
        );
        let mut run = pool.run(guard.coordinator.jobs.clone());

        while let Some(outcome) = run.next().await {
            guard.coordinator.record(outcome);

            if guard.coordinator.stop_token.is_cancelled() {
                run.terminate();
                tracing::info!(
                    processed = run.processed(),
                    remaining = guard.coordinator.jobs.len() - run.processed(),
                    "Upload pool terminated"
                );
                // Dropping the run aborts whatever is still in flight
                drop(run);
                return Ok(guard.finish(RunOutcome::Terminated));
            }
        }

        Ok(guard.finish(RunOutcome::Completed))
    }

    /// Request early termination; takes effect at the next outcome
    pub fn stop(&self) {
        request_stop(&self.stop_token);
    }

    /// Handle for stopping and observing the run from other tasks
    ///
    /// Take it before calling [`start`](Self::start), which borrows the
    /// coordinator mutably for the whole run.
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            stop_token: self.stop_token.clone(),
            state_rx: self.state_tx.subscribe(),
        }
    }
}

impl<T> UploadCoordinator<T> {
    fn record(&mut self, outcome: Outcome) {
        if outcome.is_success() {
            tracing::debug!(job = %outcome.job, status = %outcome.reason, "Upload done");
        } else {
            tracing::warn!(
                job = %outcome.job,
                code = outcome.code,
                reason = %outcome.reason,
                "Upload failed"
            );
        }
        let event = self.report.record(outcome);
        self.channel.push(event);
    }

    fn finish(&mut self, outcome: RunOutcome) -> RunOutcome {
        // Every event is pushed before the finished state becomes visible
        self.report.mark_ended();
        self.set_state(outcome.into());
        tracing::info!(
            outcome = ?outcome,
            done = self.report.done_count(),
            errors = self.report.errors().len(),
            elapsed_secs = self.report.elapsed_seconds(),
            "Upload run finished"
        );
        outcome
    }
}

/// Ends the run as terminated if the `start` future is dropped mid-run
/// (for example when wrapped in a timeout).
struct RunGuard<'a, T> {
    coordinator: &'a mut UploadCoordinator<T>,
    finished: bool,
}

impl<T> RunGuard<'_, T> {
    fn finish(&mut self, outcome: RunOutcome) -> RunOutcome {
        self.finished = true;
        self.coordinator.finish(outcome)
    }
}

impl<T> Drop for RunGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                processed = self.coordinator.report.processed(),
                "Upload run abandoned before finishing"
            );
            self.coordinator.finish(RunOutcome::Terminated);
        }
    }
}

fn request_stop(token: &CancellationToken) {
    if !token.is_cancelled() {
        tracing::info!("Stop requested for upload run");
    }
    token.cancel();
}

/// Cloneable handle to a run: request a stop, observe state, await completion.
///
/// If the coordinator is dropped the run counts as finished, so waiters never
/// hang on a run that can no longer progress.
#[derive(Clone, Debug)]
pub struct RunHandle {
    stop_token: CancellationToken,
    state_rx: tokio::sync::watch::Receiver<RunState>,
}

impl RunHandle {
    /// Request early termination; idempotent
    pub fn stop(&self) {
        request_stop(&self.stop_token);
    }

    /// Whether a stop was requested
    pub fn is_stop_requested(&self) -> bool {
        self.stop_token.is_cancelled()
    }

    /// Latest published lifecycle state
    pub fn state(&self) -> RunState {
        *self.state_rx.borrow()
    }

    /// Whether the run ended (or its coordinator is gone)
    pub fn is_finished(&self) -> bool {
        self.state().is_finished() || self.state_rx.has_changed().is_err()
    }

    /// Next event of this run from `channel`, or `None` once the run has
    /// finished and nothing is left
    ///
    /// The coordinator pushes every event before it publishes the finished state,
    /// so a `None` here means every event of the run was consumed (by this or another
    /// consumer).
    pub async fn next_event(&self, channel: &ResultChannel) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = channel.try_pop() {
                return Some(event);
            }
            if self.is_finished() {
                return channel.try_pop();
            }
            tokio::select! {
                _ = channel.notified() => {}
                _ = self.wait_finished() => {}
            }
        }
    }

    /// Wait until the run has ended and return its final state
    pub async fn wait_finished(&self) -> RunState {
        let mut rx = self.state_rx.clone();
        if let Ok(state) = rx.wait_for(RunState::is_finished).await {
            return *state;
        }
        // Coordinator dropped before finishing
        let last = *rx.borrow();
        last
    }
}
