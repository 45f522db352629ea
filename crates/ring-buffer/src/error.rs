//! Ring Buffer Error Types

use stream_model::{ElementType, StreamError};
use thiserror::Error;

/// Configuration and usage errors. Data availability is reported through
/// [`ReadStatus`](crate::ReadStatus), never through this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    /// Zero capacity, invalid rate or channel count
    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(String),

    /// Data does not hold a whole number of samples
    #[error("{bytes} bytes is not a multiple of the {frame_bytes}-byte sample size")]
    PartialSample { bytes: usize, frame_bytes: usize },

    /// Typed push or get with the wrong element type
    #[error("element type mismatch: buffer holds {expected}, got {actual}")]
    TypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },

    /// Stream shape differs from the buffer's
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Non-finite query time or negative duration
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Stream(#[from] StreamError),
}
