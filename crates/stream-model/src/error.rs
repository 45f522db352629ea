//! Stream Error Types

use crate::ElementType;
use thiserror::Error;

/// Errors raised by stream and sample operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// Sample rate is zero, negative or not finite
    #[error("invalid sample rate: {0} Hz")]
    InvalidRate(f64),

    /// Channel count of zero
    #[error("stream must have at least one channel")]
    NoChannels,

    /// Typed access with the wrong element type
    #[error("element type mismatch: stream holds {expected}, accessed as {actual}")]
    TypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },

    /// Two streams that must share a shape do not
    #[error("incompatible streams: {0}")]
    Incompatible(String),

    /// Buffer length is not a whole number of samples
    #[error("{bytes} bytes is not a multiple of the {frame_bytes}-byte sample size")]
    PartialSample { bytes: usize, frame_bytes: usize },

    /// Sample or channel index outside the stream
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Member streams of a sample do not share a start time
    #[error("stream {index} starts at {time}s, sample streams start at {expected}s")]
    Misaligned {
        index: usize,
        time: f64,
        expected: f64,
    },
}
