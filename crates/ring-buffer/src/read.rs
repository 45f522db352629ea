//! Window read results

use serde::{Deserialize, Serialize};

/// Availability of a requested window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStatus {
    /// The whole window was copied
    Success,
    /// Only the intersection with the retained range was copied; some
    /// samples were already evicted or not yet written
    Partial,
    /// Nothing of the window is retained
    NotAvailable,
    /// No push has established the time origin yet
    NotInitialized,
}

/// Outcome of a window read.
///
/// Partial reads return only the valid intersection: `copied` samples
/// starting at logical index `first_index` (absolute time `start_time`).
/// Missing samples are never padded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    pub status: ReadStatus,
    /// Samples covered by the requested window
    pub requested: usize,
    /// Samples actually copied
    pub copied: usize,
    /// Logical index of the first copied sample
    pub first_index: u64,
    /// Absolute time of the first copied sample
    pub start_time: f64,
    /// Requested samples older than the retained range
    pub missing_before: usize,
    /// Requested samples newer than the write cursor
    pub missing_after: usize,
}

impl ReadResult {
    pub(crate) fn not_initialized() -> Self {
        Self {
            status: ReadStatus::NotInitialized,
            requested: 0,
            copied: 0,
            first_index: 0,
            start_time: 0.0,
            missing_before: 0,
            missing_after: 0,
        }
    }

    /// Whether the whole window was delivered
    pub fn is_complete(&self) -> bool {
        self.status == ReadStatus::Success
    }

    /// Whether retrying later could deliver more of this window
    pub fn is_pending(&self) -> bool {
        matches!(self.status, ReadStatus::NotInitialized) || self.missing_after > 0
    }

    /// Whether part of this window is lost to eviction for good
    pub fn is_evicted(&self) -> bool {
        self.missing_before > 0
    }
}
