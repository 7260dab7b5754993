//! Open-loop arrival scheduling.
use crate::jitter::Jitter;
use crate::runner::RequestRunner;
use crate::sink::StatSink;
use std::sync::Arc;
use surge_core::StatLabels;
use tokio::sync::Semaphore;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Dispatches {
    pub launched: u64,
    pub skipped: u64,
}

/// Fires one independent request task per tick, whether or not earlier ones have finished.
///
/// Dispatched tasks are spawned onto `tracker`; the scheduler itself never waits for them.
pub(crate) struct ArrivalScheduler<R> {
    runner: Arc<R>,
    sink: StatSink,
    jitter: Jitter,
    tracker: TaskTracker,
    fanout: Option<Arc<Semaphore>>,
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    labels: StatLabels,
    dispatches: Dispatches,
}

impl<R: RequestRunner> ArrivalScheduler<R> {
    pub fn new(
        runner: Arc<R>,
        sink: StatSink,
        jitter: Jitter,
        tracker: TaskTracker,
        labels: StatLabels,
    ) -> Self {
        Self {
            runner,
            sink,
            jitter,
            tracker,
            fanout: None,
            labels,
            dispatches: Dispatches::default(),
        }
    }

    /// Caps in-flight dispatches. Ticks that find no free slot are skipped, not queued.
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.fanout = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    pub async fn run(mut self, stop: CancellationToken, cancel: CancellationToken) -> Dispatches {
        // NOTE: Deadlines accumulate from the previous deadline rather than from "now", so a
        // late wakeup shortens the following gap and the long-run rate holds.
        let mut next = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    debug!("Stop requested");
                    break;
                }
                _ = cancel.cancelled() => {
                    debug!("Run cancelled");
                    break;
                }
                _ = sleep_until(next) => {
                    self.dispatch(&cancel);
                    next += self.jitter.next_interval();
                    trace!("Next dispatch in {:?}", next.saturating_duration_since(Instant::now()));
                }
            }
        }

        self.dispatches
    }

    fn dispatch(&mut self, cancel: &CancellationToken) {
        let permit = match &self.fanout {
            Some(fanout) => match fanout.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.dispatches.skipped += 1;
                    debug!("In-flight limit reached; skipping dispatch");
                    return;
                }
            },
            None => None,
        };

        let runner = self.runner.clone();
        let sink = self.sink.clone();
        let cancel = cancel.clone();
        self.tracker.spawn(
            async move {
                runner.run_request(&cancel, &sink).await;
                drop(permit);
            }
            .in_current_span(),
        );

        self.dispatches.launched += 1;
        #[cfg(feature = "metrics")]
        metrics::counter!(self.labels.dispatched).increment(1);
    }
}
