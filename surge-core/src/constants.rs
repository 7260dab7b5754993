use std::ops::Range;
use std::time::Duration;

/// Shape parameter of the Poisson distribution used to jitter inter-arrival times.
pub const JITTER_LAMBDA: f64 = 100.0;

pub const NANOS_PER_SEC: f64 = 1e9;

/// The collector logs its progress every time this many stats have been received.
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000;

/// Output file used when none is given on the command line.
pub const DEFAULT_OUTFILE: &str = "latency.csv";

pub const DEFAULT_THREADS: usize = 1;

/// Upper bound on the stat sink's buffer. The buffer is allocated up front, so it cannot simply
/// follow the target throughput.
pub const MAX_SINK_CAPACITY: usize = 1 << 16;

/// Highest aggregate rate the jitter can pace: one request per nanosecond.
pub const MAX_THROUGHPUT: u32 = 1_000_000_000;

/// Pause between two steps of a user workflow.
pub const STEP_THINK_TIME: Range<Duration> = Duration::from_millis(100)..Duration::from_millis(600);

/// Pause after a user completes a workflow, before it starts the next one.
pub const WORKFLOW_THINK_TIME: Range<Duration> =
    Duration::from_millis(500)..Duration::from_millis(2_500);
