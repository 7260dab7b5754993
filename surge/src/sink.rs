//! Stat plumbing between request tasks and the single collector.
use async_channel::{bounded, Receiver, Sender};
use surge_core::{Stat, StatLabels, MAX_SINK_CAPACITY, PROGRESS_LOG_INTERVAL};
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

/// Producer side of the bounded stat queue.
///
/// Cloned into every request task. Pushing waits while the queue is full, so slow collection
/// throttles producers instead of growing memory.
#[derive(Clone, Debug)]
pub struct StatSink {
    tx: Sender<Stat>,
}

impl StatSink {
    pub async fn push(&self, stat: Stat) {
        if self.tx.send(stat).await.is_err() {
            warn!("Stat sink is closed; dropping stat.");
        }
    }

    /// Returns `true` only for the call that actually closed the sink.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
}

/// Creates a sink of the given capacity, clamped to `1..=MAX_SINK_CAPACITY`, and spawns its
/// collector.
pub(crate) fn channel(capacity: usize, labels: StatLabels) -> (StatSink, StatCollector) {
    let (tx, rx) = bounded(capacity.clamp(1, MAX_SINK_CAPACITY));
    let collector = StatCollector::spawn(rx, labels);
    (StatSink { tx }, collector)
}

/// Single consumer draining the sink into the result sequence.
pub(crate) struct StatCollector {
    handle: JoinHandle<Vec<Stat>>,
}

impl StatCollector {
    fn spawn(rx: Receiver<Stat>, labels: StatLabels) -> Self {
        let handle = tokio::spawn(collect(rx, labels).in_current_span());
        Self { handle }
    }

    /// Resolves once the sink is closed and fully drained.
    pub async fn finish(self) -> Result<Vec<Stat>, tokio::task::JoinError> {
        self.handle.await
    }
}

#[allow(unused_variables)]
async fn collect(rx: Receiver<Stat>, labels: StatLabels) -> Vec<Stat> {
    let mut stats = vec![];

    // NOTE: `recv` only fails once the channel is both closed and empty.
    while let Ok(stat) = rx.recv().await {
        #[cfg(feature = "metrics")]
        record(&labels, &stat);

        stats.push(stat);
        if stats.len() as u64 % PROGRESS_LOG_INTERVAL == 0 {
            info!("Processed {} requests", stats.len());
        }
    }

    debug!("Collector drained {} stats", stats.len());
    stats
}

#[cfg(feature = "metrics")]
fn record(labels: &StatLabels, stat: &Stat) {
    metrics::histogram!(labels.latency).record(stat.duration_nanos as f64);
    if stat.is_error {
        metrics::counter!(labels.error).increment(1);
    } else {
        metrics::counter!(labels.success).increment(1);
    }
}
