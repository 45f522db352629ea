//! Registry of live workers for status reporting

use crate::worker::WorkerShared;
use crate::WorkerState;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;
use sync_primitives::ExclusiveLock;

/// Point-in-time view of one worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub name: String,
    pub state: WorkerState,
    pub cycles: u64,
    pub elapsed: Duration,
}

/// Tracks workers by weak reference; dropped workers disappear on the next
/// snapshot.
#[derive(Default)]
pub struct WorkerMonitor {
    workers: ExclusiveLock<Vec<Weak<WorkerShared>>>,
}

impl WorkerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, shared: &Arc<WorkerShared>) {
        self.workers.acquire().push(Arc::downgrade(shared));
    }

    /// Status of every worker still alive, in registration order
    pub fn snapshot(&self) -> Vec<WorkerStatus> {
        let mut workers = self.workers.acquire();
        workers.retain(|w| w.strong_count() > 0);
        workers
            .iter()
            .filter_map(Weak::upgrade)
            .map(|shared| {
                let lc = shared.lifecycle.acquire();
                WorkerStatus {
                    name: shared.name.clone(),
                    state: lc.state(),
                    cycles: shared.cycles.load(Ordering::Relaxed),
                    elapsed: lc.elapsed(),
                }
            })
            .collect()
    }

    /// Number of registered workers that are entered or running
    pub fn active_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|s| s.state.is_active())
            .count()
    }
}

impl fmt::Display for WorkerMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:<11} {:>10} {:>10}", "worker", "state", "cycles", "elapsed")?;
        for s in self.snapshot() {
            writeln!(
                f,
                "{:<24} {:<11} {:>10} {:>9.3}s",
                s.name,
                format!("{:?}", s.state),
                s.cycles,
                s.elapsed.as_secs_f64()
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for WorkerMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerMonitor")
            .field("workers", &self.snapshot().len())
            .finish()
    }
}
