//! Bounded worker pool yielding upload outcomes in completion order.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::UploadError;
use crate::types::{Job, Outcome};

use super::task::UploadTask;

/// Runs an [`UploadTask`] over a job list with at most `num_workers` uploads in flight.
pub struct WorkerPool<T> {
    task: Arc<T>,
    num_workers: usize,
}

impl<T: UploadTask + 'static> WorkerPool<T> {
    /// Create a pool; a worker count of 0 is clamped to 1
    pub fn new(task: Arc<T>, num_workers: usize) -> Self {
        Self {
            task,
            num_workers: num_workers.max(1),
        }
    }

    /// Number of concurrent upload slots
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Start uploading `jobs`
    ///
    /// Nothing is dispatched until the returned stream is polled. Each upload runs
    /// in its own tokio task; outcomes are yielded as soon as they complete, with
    /// no relation to the order of `jobs`.
    pub fn run(&self, jobs: Vec<Job>) -> PoolRun {
        let terminator = CancellationToken::new();
        let task = Arc::clone(&self.task);

        let outcomes = stream::iter(jobs)
            .map(move |job| upload_in_worker(Arc::clone(&task), job))
            .buffer_unordered(self.num_workers)
            .take_until(terminator.clone().cancelled_owned())
            .boxed();

        PoolRun {
            outcomes,
            terminator,
            processed: 0,
        }
    }
}

/// A single-pass pool run, consumed as a [`Stream`] of [`Outcome`]s.
///
/// After [`terminate`](Self::terminate) the stream ends and no further job is
/// dispatched. Dropping the run aborts every upload still in flight.
pub struct PoolRun {
    outcomes: BoxStream<'static, Outcome>,
    terminator: CancellationToken,
    processed: usize,
}

impl PoolRun {
    /// Stop dispatching and end the stream
    pub fn terminate(&self) {
        self.terminator.cancel();
    }

    /// Token that terminates this run when cancelled, usable from other tasks
    pub fn terminator(&self) -> CancellationToken {
        self.terminator.clone()
    }

    /// Outcomes yielded so far
    pub fn processed(&self) -> usize {
        self.processed
    }
}

impl Stream for PoolRun {
    type Item = Outcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Outcome>> {
        let polled = self.outcomes.poll_next_unpin(cx);
        if let Poll::Ready(Some(_)) = &polled {
            self.processed += 1;
        }
        polled
    }
}

/// Aborts the wrapped task when dropped, so abandoned uploads do not linger
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Upload one job in a dedicated tokio task.
///
/// A panic inside the task is reported as a worker-fault outcome for that job
/// instead of tearing down the pool.
async fn upload_in_worker<T: UploadTask + 'static>(task: Arc<T>, job: Job) -> Outcome {
    let worker_job = job.clone();
    let handle = tokio::spawn(async move { task.upload(&worker_job).await });
    let _abort = AbortOnDrop(handle.abort_handle());

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(job = %job, error = %e, "Upload worker failed");
            Outcome::from_error(job, &UploadError::WorkerFault(e.to_string()))
        }
    }
}
