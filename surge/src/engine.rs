//! Run orchestration.
use crate::error::{EngineError, ParseModeError};
use crate::jitter::Jitter;
use crate::pool::WorkerPool;
use crate::runner::RequestRunner;
use crate::scheduler::{ArrivalScheduler, Dispatches};
use crate::sink;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use surge_core::{RunParameters, RunReport, Stat, StatLabels, DEFAULT_LABELS};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Arrival discipline of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Mode {
    /// Closed loop: a fixed set of workers, each waiting for its previous request.
    #[default]
    Pool,
    /// Open loop: requests fire at the target rate regardless of completions.
    #[cfg_attr(feature = "cli", value(name = "openloop"))]
    OpenLoop,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Pool => write!(f, "pool"),
            Mode::OpenLoop => write!(f, "openloop"),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pool" => Ok(Mode::Pool),
            "openloop" => Ok(Mode::OpenLoop),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: Mode,
    /// Stats in the order the collector received them.
    pub stats: Vec<Stat>,
    /// Open loop: dispatched tasks. Pool: requests issued by workers.
    pub dispatched: u64,
    /// Open-loop ticks dropped by the in-flight limit.
    pub skipped: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn report(&self) -> RunReport {
        RunReport::from_stats(&self.stats)
    }
}

/// Load generation engine.
///
/// Owns the run parameters and the request runner, and drives one run through
/// `Idle -> Running -> Draining -> Stopped`.
///
/// # Example
/// ```no_run
/// use surge::prelude::*;
/// use std::time::Duration;
///
/// struct Noop;
///
/// impl RequestRunner for Noop {
///     async fn run_request(&self, _cancel: &CancellationToken, sink: &StatSink) {
///         let (stat, _) = Stat::measure(async { Ok::<_, ()>(()) }).await;
///         sink.push(stat).await;
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let params = RunParameters::new(4, 0, Duration::from_secs(30), 100).unwrap();
///     let outcome = Engine::new(params, Noop)
///         .run(Mode::OpenLoop, CancellationToken::new())
///         .await
///         .unwrap();
///     println!("{}", outcome.report());
/// }
/// ```
pub struct Engine<R> {
    params: RunParameters,
    runner: Arc<R>,
    max_in_flight: Option<NonZeroUsize>,
    labels: StatLabels,
    state: watch::Sender<EngineState>,
}

impl<R: RequestRunner> Engine<R> {
    pub fn new(params: RunParameters, runner: R) -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self {
            params,
            runner: Arc::new(runner),
            max_in_flight: None,
            labels: DEFAULT_LABELS,
            state,
        }
    }

    /// Bounds open-loop fan-out to `limit` concurrent requests.
    ///
    /// Ticks that arrive while the limit is reached are skipped and counted in
    /// [`RunOutcome::skipped`]. Has no effect on pool runs, which are bounded by the thread
    /// count already.
    pub fn max_in_flight(mut self, limit: NonZeroUsize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    pub fn labels(mut self, labels: StatLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Runs the workload until the duration elapses, `cancel` fires, or (in pool mode) the
    /// request cap is reached.
    ///
    /// Requests already started are always awaited, so the configured duration is a lower
    /// bound on the run time.
    #[instrument(name = "engine", skip_all, fields(mode = %mode))]
    pub async fn run(self, mode: Mode, cancel: CancellationToken) -> Result<RunOutcome, EngineError> {
        info!("Target throughput {}", self.params.throughput());
        info!(
            "Target duration {}",
            humantime::format_duration(self.params.duration())
        );

        let start = Instant::now();
        let (dispatches, stats, cancelled) = match mode {
            Mode::OpenLoop => self.run_open_loop(&cancel).await?,
            Mode::Pool => self.run_pool(&cancel).await?,
        };

        let outcome = RunOutcome {
            mode,
            stats,
            dispatched: dispatches.launched,
            skipped: dispatches.skipped,
            elapsed: start.elapsed(),
            cancelled,
        };
        self.state.send_replace(EngineState::Stopped);
        info!("Finished all requests");

        Ok(outcome)
    }

    async fn run_open_loop(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Dispatches, Vec<Stat>, bool), EngineError> {
        let mean = Jitter::mean_for(self.params.throughput().get() as f64)?;
        let jitter = Jitter::new(mean, self.params.seed())?;
        info!("Ticking after every {:?}", mean);

        let (sink, collector) = sink::channel(self.params.throughput().get() as usize, self.labels);
        let tracker = TaskTracker::new();
        let mut scheduler = ArrivalScheduler::new(
            self.runner.clone(),
            sink.clone(),
            jitter,
            tracker.clone(),
            self.labels,
        );
        if let Some(limit) = self.max_in_flight {
            scheduler = scheduler.max_in_flight(limit.get());
        }

        let stop = CancellationToken::new();
        let scheduler = tokio::spawn(
            scheduler
                .run(stop.clone(), cancel.clone())
                .in_current_span(),
        );
        self.state.send_replace(EngineState::Running);

        let cancelled = self.wait_for_end(cancel, std::future::pending()).await;

        self.state.send_replace(EngineState::Draining);
        stop.cancel();
        let dispatches = scheduler.await;

        tracker.close();
        tracker.wait().await;
        if let Ok(dispatches) = &dispatches {
            info!("Total launched requests: {}", dispatches.launched);
        }
        sink.close();
        let stats = collector.finish().await?;

        Ok((dispatches?, stats, cancelled))
    }

    async fn run_pool(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Dispatches, Vec<Stat>, bool), EngineError> {
        let threads = self.params.thread_count().get();
        let per_worker = self.params.throughput().get() as f64 / threads as f64;
        let mean = Jitter::mean_for(per_worker)?;
        let jitters = (0..threads)
            .map(|id| Jitter::new(mean, self.params.seed().map(|s| s.wrapping_add(id as u64))))
            .collect::<Result<Vec<_>, _>>()?;
        let max_requests = self.params.max_requests().map_or(u64::MAX, |m| m.get());
        info!("Per-worker throughput {per_worker:.2}, ticking after every {mean:?}");

        let (sink, collector) = sink::channel(2 * threads, self.labels);
        let stop = CancellationToken::new();
        let pool = WorkerPool::spawn(
            self.runner.clone(),
            &sink,
            jitters,
            max_requests,
            &stop,
            cancel,
        );
        self.state.send_replace(EngineState::Running);

        let cancelled = self.wait_for_end(cancel, pool.idle()).await;
        if !cancelled && pool.issued() >= max_requests {
            info!("Request cap of {max_requests} reached");
        }

        self.state.send_replace(EngineState::Draining);
        stop.cancel();
        let issued = pool.join().await;
        sink.close();
        let stats = collector.finish().await?;

        let dispatches = Dispatches {
            launched: issued,
            skipped: 0,
        };
        Ok((dispatches, stats, cancelled))
    }

    /// Returns whether the run ended because of external cancellation.
    ///
    /// Cancellation is checked first, so a cancelled run is reported as such even when the
    /// producers have already wound down on their own.
    async fn wait_for_end(
        &self,
        cancel: &CancellationToken,
        done: impl std::future::Future<Output = ()>,
    ) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Cancellation requested");
                true
            }
            _ = done => {
                info!("All producers finished");
                false
            }
            _ = sleep(self.params.duration()) => {
                info!("Run duration elapsed");
                false
            }
        }
    }
}
