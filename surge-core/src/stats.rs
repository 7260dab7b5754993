use crate::Stat;
use std::fmt;

/// Aggregate numbers for a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub total: u64,
    pub successes: u64,
    pub errors: u64,
    /// `None` when no request completed.
    pub average_latency_nanos: Option<f64>,
}

impl RunReport {
    pub fn from_stats(stats: &[Stat]) -> Self {
        let total = stats.len() as u64;
        let errors = stats.iter().filter(|s| s.is_error).count() as u64;
        let sum: i128 = stats.iter().map(|s| s.duration_nanos as i128).sum();
        let average_latency_nanos = (total > 0).then(|| sum as f64 / total as f64);

        Self {
            total,
            successes: total - errors,
            errors,
            average_latency_nanos,
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.
        } else {
            self.errors as f64 / self.total as f64
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Number of Requests: {}", self.total)?;
        writeln!(f, "Successful Requests: {}", self.successes)?;
        writeln!(f, "Error Responses: {}", self.errors)?;
        match self.average_latency_nanos {
            Some(avg) => write!(f, "Average Latency: {avg:.0}"),
            None => write!(f, "Average Latency: n/a"),
        }
    }
}
