use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Measurement of one request attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    /// Wall-clock start, nanoseconds since the Unix epoch.
    pub start_nanos: i64,
    pub duration_nanos: i64,
    pub is_error: bool,
    /// Request name, for workloads that mix several operations.
    pub name: Option<Arc<str>>,
}

impl Stat {
    pub fn new(start_nanos: i64, duration_nanos: i64, is_error: bool) -> Self {
        Self {
            start_nanos,
            duration_nanos,
            is_error,
            name: None,
        }
    }

    pub fn named(mut self, name: Arc<str>) -> Self {
        self.name = Some(name);
        self
    }

    /// Times `fut` and classifies the attempt by its result.
    ///
    /// The duration is taken from the runtime clock, so it follows tokio's paused time in tests.
    pub async fn measure<F, T, E>(fut: F) -> (Self, Result<T, E>)
    where
        F: Future<Output = Result<T, E>>,
    {
        let start_nanos = epoch_nanos();
        let start = Instant::now();
        let res = fut.await;
        let duration_nanos = i64::try_from(start.elapsed().as_nanos()).unwrap_or(i64::MAX);

        (Self::new(start_nanos, duration_nanos, res.is_err()), res)
    }
}

pub fn epoch_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
