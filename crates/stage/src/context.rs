//! Shared pipeline state injected into workers

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use worker::WorkerMonitor;

/// Counters and worker registry owned by the composing pipeline and handed
/// to every worker at construction.
#[derive(Debug, Default)]
pub struct PipelineContext {
    samples_pushed: AtomicU64,
    samples_consumed: AtomicU64,
    windows_consumed: AtomicU64,
    windows_partial: AtomicU64,
    monitor: WorkerMonitor,
}

/// Copy of the counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextSnapshot {
    pub samples_pushed: u64,
    pub samples_consumed: u64,
    pub windows_consumed: u64,
    pub windows_partial: u64,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monitor(&self) -> &WorkerMonitor {
        &self.monitor
    }

    pub fn record_pushed(&self, samples: usize) {
        self.samples_pushed.fetch_add(samples as u64, Ordering::Relaxed);
    }

    /// Count one delivered window; `partial` when samples were lost to
    /// eviction
    pub fn record_window(&self, samples: usize, partial: bool) {
        self.samples_consumed.fetch_add(samples as u64, Ordering::Relaxed);
        self.windows_consumed.fetch_add(1, Ordering::Relaxed);
        if partial {
            self.windows_partial.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            samples_pushed: self.samples_pushed.load(Ordering::Relaxed),
            samples_consumed: self.samples_consumed.load(Ordering::Relaxed),
            windows_consumed: self.windows_consumed.load(Ordering::Relaxed),
            windows_partial: self.windows_partial.load(Ordering::Relaxed),
        }
    }
}
