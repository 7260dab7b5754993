use crate::{ConfigError, DEFAULT_THREADS, MAX_THROUGHPUT};
use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::path::Path;
use std::time::Duration;

/// Parameters of a single run.
///
/// Validated on construction and immutable afterwards; the engine only reads them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunParameters {
    thread_count: NonZeroUsize,
    max_requests: Option<NonZeroU64>,
    duration: Duration,
    throughput: NonZeroU32,
    seed: Option<u64>,
}

impl RunParameters {
    /// A `max_requests` of zero means the run is only bounded by its duration.
    pub fn new(
        thread_count: usize,
        max_requests: u64,
        duration: Duration,
        throughput: u32,
    ) -> Result<Self, ConfigError> {
        if throughput > MAX_THROUGHPUT {
            return Err(ConfigError::ExcessiveThroughput(throughput));
        }

        Ok(Self {
            thread_count: NonZeroUsize::new(thread_count).ok_or(ConfigError::NoThreads)?,
            max_requests: NonZeroU64::new(max_requests),
            duration,
            throughput: NonZeroU32::new(throughput).ok_or(ConfigError::ZeroThroughput)?,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn thread_count(&self) -> NonZeroUsize {
        self.thread_count
    }

    pub fn max_requests(&self) -> Option<NonZeroU64> {
        self.max_requests
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn throughput(&self) -> NonZeroU32 {
        self.throughput
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// On-disk run configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_threads")]
    pub num_threads: usize,
    #[serde(default)]
    pub num_reqs: u64,
    pub duration: String,
    #[serde(default)]
    pub tput: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub workload: Option<WorkloadConfig>,
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

impl RunConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Zero leaves the configured throughput untouched.
    pub fn override_tput(&mut self, tput: u32) {
        if tput != 0 {
            self.tput = tput;
        }
    }

    /// An empty string leaves the configured duration untouched.
    pub fn override_duration(&mut self, duration: &str) {
        if !duration.is_empty() {
            self.duration = duration.to_string();
        }
    }

    pub fn parameters(&self) -> Result<RunParameters, ConfigError> {
        let duration = humantime::parse_duration(self.duration.trim()).map_err(|source| {
            ConfigError::InvalidDuration {
                value: self.duration.clone(),
                source,
            }
        })?;

        let params = RunParameters::new(self.num_threads, self.num_reqs, duration, self.tput)?;
        Ok(match self.seed {
            Some(seed) => params.with_seed(seed),
            None => params,
        })
    }
}

/// HTTP workload definition.
///
/// Either a weighted mix of independent endpoints (`apis`) or a set of multi-step user
/// `workflows`; when both are given the workflows take precedence.
#[derive(Clone, Debug, Deserialize)]
pub struct WorkloadConfig {
    pub url: String,
    #[serde(default)]
    pub is_original: bool,
    #[serde(default)]
    pub apis: Vec<ApiConfig>,
    #[serde(default)]
    pub workflows: Vec<WorkflowConfig>,
}

/// An ordered sequence of calls issued by one simulated user.
#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowConfig {
    pub name: String,
    pub steps: Vec<ApiConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub method: ApiMethod,
    #[serde(default = "default_proportion")]
    pub proportion: u32,
    #[serde(rename = "arg_gen_func_name")]
    pub generator: String,
}

fn default_proportion() -> u32 {
    1
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    #[default]
    Get,
    Post,
}
