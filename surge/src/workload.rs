//! Built-in request runners for HTTP workloads.
//!
//! A workload is either a weighted mix of named endpoints or a set of workflows that simulated
//! users walk through step by step. Each endpoint names an argument generator from a
//! [`Registry`], which is resolved once when the runner is built.
mod hotel;
#[cfg(feature = "http")]
mod http;
mod registry;
mod shop;
#[cfg(feature = "http")]
mod workflow;

#[cfg(feature = "http")]
pub use http::HttpRunner;
#[cfg(feature = "http")]
pub use workflow::WorkflowRunner;
pub use registry::{ArgGenerator, Encoding, Params, Registry};
