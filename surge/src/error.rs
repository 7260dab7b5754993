use surge_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
#[error("Unknown mode {0:?}; expected `pool` or `openloop`")]
pub struct ParseModeError(pub String);
