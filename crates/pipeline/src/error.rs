//! Pipeline Error Types

use ring_buffer::BufferError;
use stage::StageError;
use thiserror::Error;
use worker::WorkerError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file or environment could not be read
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Logging could not be initialised
    #[error("logging error: {0}")]
    Logging(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}
