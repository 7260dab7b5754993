//! Closed-loop worker pool.
use crate::jitter::Jitter;
use crate::runner::RequestRunner;
use crate::sink::StatSink;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Stopped,
    Cancelled,
    Exhausted,
}

/// Fixed set of workers, each issuing its requests strictly one after another.
pub(crate) struct WorkerPool {
    tracker: TaskTracker,
    handles: Vec<JoinHandle<WorkerExit>>,
    issued: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Spawns one worker per jitter stream.
    ///
    /// Workers stop once the shared request counter reaches `max_requests`. The check races
    /// with the other workers, so up to one extra request per worker can slip through.
    pub fn spawn<R: RequestRunner>(
        runner: Arc<R>,
        sink: &StatSink,
        jitters: Vec<Jitter>,
        max_requests: u64,
        stop: &CancellationToken,
        cancel: &CancellationToken,
    ) -> Self {
        let tracker = TaskTracker::new();
        let issued = Arc::new(AtomicU64::new(0));

        let handles = jitters
            .into_iter()
            .enumerate()
            .map(|(id, jitter)| {
                let worker = Worker {
                    id,
                    runner: runner.clone(),
                    sink: sink.clone(),
                    jitter,
                    issued: issued.clone(),
                    max_requests,
                };
                tracker.spawn(
                    worker
                        .run(stop.clone(), cancel.clone())
                        .in_current_span(),
                )
            })
            .collect();
        tracker.close();

        Self {
            tracker,
            handles,
            issued,
        }
    }

    /// Resolves once every worker has returned on its own.
    pub async fn idle(&self) {
        self.tracker.wait().await
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Waits for all workers and returns how many requests they issued.
    pub async fn join(self) -> u64 {
        for handle in self.handles {
            match handle.await {
                Ok(exit) => trace!("Worker exited: {exit:?}"),
                Err(err) => error!("Worker failed: {err}"),
            }
        }
        self.issued.load(Ordering::Relaxed)
    }
}

struct Worker<R> {
    id: usize,
    runner: Arc<R>,
    sink: StatSink,
    jitter: Jitter,
    issued: Arc<AtomicU64>,
    max_requests: u64,
}

impl<R: RequestRunner> Worker<R> {
    async fn run(mut self, stop: CancellationToken, cancel: CancellationToken) -> WorkerExit {
        let mut next = Instant::now();
        let mut count = 0u64;

        let exit = loop {
            if self.issued.load(Ordering::Relaxed) >= self.max_requests {
                break WorkerExit::Exhausted;
            }

            tokio::select! {
                biased;
                _ = stop.cancelled() => break WorkerExit::Stopped,
                _ = cancel.cancelled() => break WorkerExit::Cancelled,
                _ = sleep_until(next) => {
                    // NOTE: Awaiting the request here is what closes the loop; the next
                    // deadline is only computed once this one has returned.
                    self.runner.run_request(&cancel, &self.sink).await;
                    count += 1;
                    next += self.jitter.next_interval();
                    self.issued.fetch_add(1, Ordering::Relaxed);
                }
            }
        };

        debug!(worker = self.id, requests = count, "Worker finished: {exit:?}");
        exit
    }
}
