mod config;
mod constants;
mod error;
mod metrics;
mod stat;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use metrics::*;
pub use stat::*;
pub use stats::*;
