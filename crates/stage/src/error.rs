//! Stage Error Types

use ring_buffer::BufferError;
use stream_model::StreamError;
use thiserror::Error;

/// Configuration errors and contract violations of a stage
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// Declared and actual streams disagree, or a required auxiliary
    /// stream is missing. Raised at enter; the stage must not run.
    #[error("stage '{stage}' configuration error: {reason}")]
    Config { stage: String, reason: String },

    /// `process` produced a different sample count than the declared
    /// rate conversion implies
    #[error("stage '{stage}' produced {actual} samples, expected {expected}")]
    OutputCount {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// Input chunk length incompatible with the rate conversion
    #[error("stage '{stage}': chunk of {len} samples is not a multiple of {factor}")]
    ChunkSize {
        stage: String,
        len: usize,
        factor: usize,
    },

    /// Auxiliary stream not time-aligned with the primary input
    #[error("stage '{stage}': aux stream {index} starts at {actual}s, primary at {expected}s")]
    Misaligned {
        stage: String,
        index: usize,
        expected: f64,
        actual: f64,
    },

    /// `process` or `flush` called before a successful `enter`
    #[error("stage '{0}' has not been entered")]
    NotEntered(String),

    /// Failure reported by the stage itself
    #[error("stage '{stage}' failed: {reason}")]
    Process { stage: String, reason: String },

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl StageError {
    pub fn config(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a configuration error raised at enter
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
