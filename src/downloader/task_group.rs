//! Fan-out/fan-in primitive for concurrent leaf-document tasks
//!
//! A [`TaskGroup`] accepts work as the traverser discovers it, runs each unit
//! as an independent tokio task under an optional admission cap, and collects
//! every emitted result through a buffered channel. The three operations
//! (submit, join, cancel) make the batch lifecycle explicit: traversal
//! submits, the aggregator joins, and a structural failure cancels.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Result channel capacity. Must exceed realistic batch sizes: the single
/// consumer only drains after all tasks finish, so a full channel would
/// stall task completion.
pub(crate) const RESULT_BUFFER: usize = 1000;

/// A group of concurrent tasks feeding results into one collection point
///
/// Generic over the result type so tests can drive it with plain values.
pub(crate) struct TaskGroup<T> {
    tasks: JoinSet<()>,
    tx: mpsc::Sender<T>,
    rx: mpsc::Receiver<T>,
    permits: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Create a group with an optional concurrency cap
    ///
    /// `None` launches every submitted task immediately (unbounded mode).
    pub(crate) fn new(max_concurrent: Option<usize>) -> Self {
        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        Self {
            tasks: JoinSet::new(),
            tx,
            rx,
            permits: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn one unit of work
    ///
    /// The task acquires an admission slot (when capped) before running and
    /// releases it unconditionally when it finishes, successfully or not.
    /// Work submitted after [`cancel`](Self::cancel), or still waiting for a
    /// slot at cancellation time, never runs and emits no result.
    pub(crate) fn submit<F>(&mut self, work: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let tx = self.tx.clone();
        let permits = self.permits.clone();
        let cancel = self.cancel.clone();

        self.tasks.spawn(async move {
            let _permit = match permits {
                Some(semaphore) => {
                    let acquired = tokio::select! {
                        _ = cancel.cancelled() => return,
                        acquired = semaphore.acquire_owned() => acquired,
                    };
                    match acquired {
                        Ok(permit) => Some(permit),
                        Err(_) => return,
                    }
                }
                None => None,
            };

            if cancel.is_cancelled() {
                return;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = work => result,
            };

            // A send only fails if the receiver is gone, which means the
            // group was abandoned; the result is intentionally dropped then.
            let _ = tx.send(result).await;
        });
    }

    /// Cancel outstanding work
    ///
    /// Tasks waiting for an admission slot or still running stop without
    /// emitting a result; results already emitted remain in the channel.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for all submitted work to finish, then drain and return every
    /// emitted result (in completion order)
    pub(crate) async fn join(mut self) -> Vec<T> {
        while self.tasks.join_next().await.is_some() {}
        drop(self.tx);

        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }
}
