#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod engine;
pub mod error;
pub mod report;
pub mod runner;
pub mod sink;
pub mod workload;

pub(crate) mod jitter;
pub(crate) mod pool;
pub(crate) mod scheduler;

pub use engine::{Engine, EngineState, Mode, RunOutcome};
pub use error::{EngineError, ParseModeError};
pub use runner::RequestRunner;
pub use sink::StatSink;
pub use surge_core as core;
pub use surge_core::{RunParameters, RunReport, Stat};

pub mod prelude {
    pub use crate::engine::{Engine, EngineState, Mode, RunOutcome};
    pub use crate::runner::RequestRunner;
    pub use crate::sink::StatSink;
    pub use surge_core::{RunParameters, RunReport, Stat};
    pub use tokio_util::sync::CancellationToken;
}
