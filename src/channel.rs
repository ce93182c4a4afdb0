//! Unbounded progress channel shared between the coordinator and its consumers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use crate::types::ProgressEvent;

/// Unbounded multi-producer/multi-consumer queue of [`ProgressEvent`]s
///
/// Cloning yields another handle to the same queue. `push` never blocks; `pop`
/// waits until an event arrives. `is_empty` and `len` are snapshots that may be
/// stale by the time the caller acts on them, so consumers should drain with
/// [`try_pop`](Self::try_pop) or [`RunHandle::next_event`](crate::RunHandle::next_event)
/// instead of checking first.
#[derive(Clone, Default)]
pub struct ResultChannel {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    buffer: Mutex<VecDeque<ProgressEvent>>,
    available: Notify,
}

impl ResultChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and wake one waiting consumer
    pub fn push(&self, event: ProgressEvent) {
        self.buffer().push_back(event);
        self.inner.available.notify_one();
    }

    /// Remove the oldest event without waiting
    pub fn try_pop(&self) -> Option<ProgressEvent> {
        self.buffer().pop_front()
    }

    /// Remove the oldest event, waiting until one is available
    pub async fn pop(&self) -> ProgressEvent {
        loop {
            if let Some(event) = self.try_pop() {
                return event;
            }
            self.inner.available.notified().await;
        }
    }

    /// Take every event currently buffered
    pub fn drain(&self) -> Vec<ProgressEvent> {
        self.buffer().drain(..).collect()
    }

    /// Number of buffered events at this instant
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    /// Whether the buffer is empty at this instant
    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    /// Resolves at the next push, or immediately if a push went unobserved
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.inner.available.notified()
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<ProgressEvent>> {
        // Pushes and pops cannot leave the deque half-updated, so a poisoned lock is still usable
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResultChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultChannel")
            .field("len", &self.len())
            .finish()
    }
}
