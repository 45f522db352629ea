//! Cooperative Worker Implementation

use crate::monitor::WorkerMonitor;
use crate::{TaskError, WorkerError, WorkerState};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sync_primitives::{Condition, ExclusiveLock};
use tracing::{debug, error, info, warn};

/// Work executed by a [`Worker`] on its own thread
pub trait Runnable: Send + 'static {
    /// Resource setup, run once before the loop. An error here is reported
    /// by [`Worker::start`] and the loop never runs.
    fn enter(&mut self, _ctx: &WorkerContext) -> Result<(), TaskError> {
        Ok(())
    }

    /// Loop body. Runs until a stop is requested, or once in
    /// single-execution mode. Long waits inside should be bounded (e.g. by
    /// a timer period) so that stop requests are observed promptly.
    fn run(&mut self, ctx: &WorkerContext) -> Result<(), TaskError>;

    /// Resource teardown, run once after the loop exits
    fn flush(&mut self, _ctx: &WorkerContext) -> Result<(), TaskError> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct Lifecycle {
    pub(crate) state: Option<WorkerState>,
    pub(crate) started_at: Option<Instant>,
    pub(crate) stopped_at: Option<Instant>,
    enter_error: Option<TaskError>,
    run_error: Option<TaskError>,
    flush_error: Option<TaskError>,
}

impl Lifecycle {
    pub(crate) fn state(&self) -> WorkerState {
        self.state.unwrap_or(WorkerState::Created)
    }

    pub(crate) fn elapsed(&self) -> Duration {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }
}

/// State shared between a worker handle, its thread and the monitor
pub(crate) struct WorkerShared {
    pub(crate) name: String,
    pub(crate) lifecycle: ExclusiveLock<Lifecycle>,
    state_changed: Condition,
    stop: AtomicBool,
    first_cycle: AtomicBool,
    pub(crate) cycles: AtomicU64,
}

impl WorkerShared {
    fn advance(&self, to: WorkerState) -> Result<(), WorkerError> {
        let mut lc = self.lifecycle.acquire();
        let next = lc.state().transition(to).map_err(|e| match e {
            WorkerError::NotEntered(_) => WorkerError::NotEntered(self.name.clone()),
            other => other,
        })?;
        lc.state = Some(next);
        drop(lc);
        self.state_changed.signal_all();
        Ok(())
    }
}

/// View of the worker handed to every [`Runnable`] hook
pub struct WorkerContext {
    shared: Arc<WorkerShared>,
}

impl WorkerContext {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether a stop has been requested
    pub fn should_stop(&self) -> bool {
        self.shared.stop.load(Ordering::Acquire)
    }

    /// Ask the loop to end after the current iteration
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    /// True during the first loop iteration
    pub fn is_first_cycle(&self) -> bool {
        self.shared.first_cycle.load(Ordering::Acquire)
    }

    /// Completed loop iterations
    pub fn cycle(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }
}

/// Summary returned when a worker has been joined
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub name: String,
    pub cycles: u64,
    pub elapsed: Duration,
}

/// Owning handle of a cooperative worker thread
pub struct Worker<R: Runnable> {
    shared: Arc<WorkerShared>,
    single_execution: bool,
    /// Present whenever the thread is not running
    runnable: Option<R>,
    handle: Option<JoinHandle<R>>,
}

impl<R: Runnable> Worker<R> {
    /// Create a worker in the `Created` state
    pub fn new(name: impl Into<String>, runnable: R) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                name: name.into(),
                lifecycle: ExclusiveLock::new(Lifecycle::default()),
                state_changed: Condition::new(),
                stop: AtomicBool::new(false),
                first_cycle: AtomicBool::new(true),
                cycles: AtomicU64::new(0),
            }),
            single_execution: false,
            runnable: Some(runnable),
            handle: None,
        }
    }

    /// Run the loop body exactly once instead of until stopped
    pub fn single_execution(mut self) -> Self {
        self.single_execution = true;
        self
    }

    /// Make the worker visible in `monitor` snapshots
    pub fn with_monitor(self, monitor: &WorkerMonitor) -> Self {
        monitor.register(&self.shared);
        self
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> WorkerState {
        self.shared.lifecycle.acquire().state()
    }

    /// Entered or running
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// Spawn the thread and block until `enter` has completed on it.
    ///
    /// Fails with [`WorkerError::AlreadyRunning`] if the worker is started,
    /// and with [`WorkerError::Enter`] if `enter` failed (the worker is then
    /// `Terminated` and may be started again).
    pub fn start(&mut self) -> Result<(), WorkerError> {
        let name = self.shared.name.clone();
        if self.handle.is_some() {
            return Err(WorkerError::AlreadyRunning(name));
        }
        {
            let mut lc = self.shared.lifecycle.acquire();
            match lc.state() {
                WorkerState::Created => {}
                WorkerState::Terminated => lc.state = Some(WorkerState::Created),
                _ => return Err(WorkerError::AlreadyRunning(name)),
            }
            lc.started_at = None;
            lc.stopped_at = None;
        }
        let runnable = self
            .runnable
            .take()
            .ok_or_else(|| WorkerError::AlreadyRunning(name.clone()))?;

        self.shared.stop.store(false, Ordering::Release);
        self.shared.first_cycle.store(true, Ordering::Release);
        self.shared.cycles.store(0, Ordering::Relaxed);

        info!(
            "start '{}'{}",
            name,
            if self.single_execution { " (single run)" } else { "" }
        );

        let shared = Arc::clone(&self.shared);
        let single = self.single_execution;
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || thread_main(runnable, shared, single))
            .map_err(|e| WorkerError::Spawn {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        self.handle = Some(handle);

        // Handshake: wait until enter has finished on the worker thread
        let mut lc = self.shared.lifecycle.acquire();
        self.shared.state_changed.wait_while(&mut lc, |lc| {
            lc.state() == WorkerState::Created && lc.enter_error.is_none()
        });

        if let Some(source) = lc.enter_error.take() {
            lc.state = Some(WorkerState::Terminated);
            drop(lc);
            if let Some(handle) = self.handle.take() {
                match handle.join() {
                    Ok(runnable) => self.runnable = Some(runnable),
                    Err(_) => return Err(WorkerError::Panicked(name)),
                }
            }
            return Err(WorkerError::Enter { name, source });
        }

        lc.started_at = Some(Instant::now());
        Ok(())
    }

    /// Ask the loop to end after its current iteration; does not block
    pub fn request_stop(&self) {
        debug!("stop requested for '{}'", self.shared.name);
        self.shared.stop.store(true, Ordering::Release);
    }

    /// Request a stop and wait for the thread to exit
    pub fn stop(&mut self) -> Result<WorkerReport, WorkerError> {
        self.request_stop();
        self.join()
    }

    /// Block until the worker thread has fully exited (after `flush`)
    pub fn join(&mut self) -> Result<WorkerReport, WorkerError> {
        let name = self.shared.name.clone();
        let handle = self
            .handle
            .take()
            .ok_or_else(|| WorkerError::NotStarted(name.clone()))?;

        let joined = handle.join();

        let mut lc = self.shared.lifecycle.acquire();
        lc.stopped_at = Some(Instant::now());
        lc.state = Some(WorkerState::Terminated);
        let elapsed = lc.elapsed();
        let run_error = lc.run_error.take();
        let flush_error = lc.flush_error.take();
        drop(lc);

        match joined {
            Ok(runnable) => self.runnable = Some(runnable),
            Err(_) => {
                error!("worker '{}' panicked", name);
                return Err(WorkerError::Panicked(name));
            }
        }

        info!(
            "stop{}after {:?} '{}'",
            if self.single_execution { " single execution " } else { " " },
            elapsed,
            name
        );

        if let Some(source) = run_error {
            return Err(WorkerError::Run { name, source });
        }
        if let Some(source) = flush_error {
            return Err(WorkerError::Flush { name, source });
        }

        Ok(WorkerReport {
            name,
            cycles: self.shared.cycles.load(Ordering::Relaxed),
            elapsed,
        })
    }

    /// Time since `start`, frozen once stopped
    pub fn elapsed(&self) -> Duration {
        self.shared.lifecycle.acquire().elapsed()
    }

    /// The runnable, while the thread is not running
    pub fn runnable(&self) -> Option<&R> {
        self.runnable.as_ref()
    }

    pub fn runnable_mut(&mut self) -> Option<&mut R> {
        self.runnable.as_mut()
    }

    /// Give back the runnable; `None` while the thread is still running
    pub fn into_inner(mut self) -> Option<R> {
        self.runnable.take()
    }
}

impl<R: Runnable> Drop for Worker<R> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("worker '{}' dropped while running, stopping", self.shared.name);
            if let Err(e) = self.stop() {
                warn!("{}", e);
            }
        }
    }
}

fn thread_main<R: Runnable>(mut runnable: R, shared: Arc<WorkerShared>, single: bool) -> R {
    let ctx = WorkerContext {
        shared: Arc::clone(&shared),
    };

    // A panicking enter must still release the start handshake
    match panic::catch_unwind(AssertUnwindSafe(|| runnable.enter(&ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("enter failed '{}': {}", shared.name, e);
            shared.lifecycle.acquire().enter_error = Some(e);
            shared.state_changed.signal_all();
            return runnable;
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            error!("enter panicked '{}': {}", shared.name, message);
            shared.lifecycle.acquire().enter_error = Some(message.into());
            shared.state_changed.signal_all();
            panic::resume_unwind(payload);
        }
    }

    let entered = shared
        .advance(WorkerState::Entered)
        .and_then(|_| shared.advance(WorkerState::Running));
    if let Err(e) = entered {
        error!("{}", e);
        return runnable;
    }

    if single {
        if let Err(e) = runnable.run(&ctx) {
            error!("run failed '{}': {}", shared.name, e);
            shared.lifecycle.acquire().run_error = Some(e);
        }
        shared.cycles.fetch_add(1, Ordering::Relaxed);
    } else {
        while !shared.stop.load(Ordering::Acquire) {
            if let Err(e) = runnable.run(&ctx) {
                error!("run failed '{}': {}", shared.name, e);
                shared.lifecycle.acquire().run_error = Some(e);
                break;
            }
            shared.first_cycle.store(false, Ordering::Release);
            shared.cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    if let Err(e) = runnable.flush(&ctx) {
        warn!("flush failed '{}': {}", shared.name, e);
        shared.lifecycle.acquire().flush_error = Some(e);
    }
    if let Err(e) = shared.advance(WorkerState::Flushed) {
        error!("{}", e);
    }

    runnable
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Suspend the calling thread
pub fn sleep_ms(milliseconds: u64) {
    std::thread::sleep(Duration::from_millis(milliseconds));
}

/// Suspend the calling thread; negative or non-finite values do not sleep
pub fn sleep_s(seconds: f64) {
    if seconds.is_finite() && seconds > 0.0 {
        std::thread::sleep(Duration::from_secs_f64(seconds));
    }
}
