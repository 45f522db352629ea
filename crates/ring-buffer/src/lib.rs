//! Time-Indexed Ring Buffer
//!
//! Decouples a single producer appending chunks at a stream's native rate
//! from any number of consumers reading arbitrary `(time, duration)`
//! windows. Storage is capacity-bounded; the oldest samples are overwritten
//! silently once the buffer is full.

mod buffer;
mod error;
mod read;

pub use buffer::{BufferConfig, BufferStats, TimeRingBuffer, DEFAULT_CAPACITY_SECONDS};
pub use error::BufferError;
pub use read::{ReadResult, ReadStatus};
