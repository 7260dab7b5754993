use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid duration {value:?}: {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Target throughput must be positive.")]
    ZeroThroughput,

    #[error("Target throughput {0} exceeds one request per nanosecond.")]
    ExcessiveThroughput(u32),

    #[error("Thread count must be positive.")]
    NoThreads,

    #[error("Unable to build jitter distribution: {0}")]
    Jitter(#[from] rand_distr::PoissonError),

    #[error("Workload defines no operations with a positive proportion.")]
    NoOperations,

    #[error("Workload defines no workflows with at least one step.")]
    NoWorkflows,

    #[error("Invalid target url {0:?}")]
    InvalidUrl(String),
}
