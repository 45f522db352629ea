//! Window reads for consumer stages

use crate::StageError;
use ring_buffer::{ReadResult, TimeRingBuffer};
use std::sync::Arc;
use stream_model::Stream;

/// Pulls `(time, duration)` windows from a shared ring buffer.
///
/// Availability is a return value, never an error: `read` returns `false`
/// when the window is not yet (fully) written, leaving retry policy to the
/// caller. Errors are reserved for shape mismatches and invalid queries.
pub struct BufferReader {
    buffer: Arc<TimeRingBuffer>,
    last: Option<ReadResult>,
}

impl BufferReader {
    pub fn new(buffer: Arc<TimeRingBuffer>) -> Self {
        Self { buffer, last: None }
    }

    pub fn buffer(&self) -> &Arc<TimeRingBuffer> {
        &self.buffer
    }

    /// Copy the window into `out`.
    ///
    /// Returns `true` once nothing more can arrive for the window: either
    /// it was copied whole, or its head was already evicted and `out` holds
    /// the surviving tail (see [`last_result`](Self::last_result)).
    /// Returns `false` while any part of it lies in the future.
    pub fn read(&mut self, time: f64, duration: f64, out: &mut Stream) -> Result<bool, StageError> {
        let result = self.buffer.get_stream(out, time, duration)?;
        self.last = Some(result);
        Ok(!result.is_pending())
    }

    /// Outcome of the most recent read
    pub fn last_result(&self) -> Option<&ReadResult> {
        self.last.as_ref()
    }
}
