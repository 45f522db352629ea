//! Producer and consumer workers around a shared ring buffer

use crate::contract::validate_inputs;
use crate::{BufferReader, ConsumerStage, PipelineContext, StageError, StageInfo};
use ring_buffer::TimeRingBuffer;
use std::sync::Arc;
use stream_model::Stream;
use sync_primitives::PeriodicTimer;
use tracing::{debug, info, warn};
use worker::{Runnable, TaskError, WorkerContext};

/// Source of producer chunks
pub trait SampleSource: Send + 'static {
    /// Fill `chunk`, which is already sized and stamped with its start
    /// time. The source may shorten it.
    fn fill(&mut self, chunk: &mut Stream) -> Result<(), TaskError>;
}

impl<F> SampleSource for F
where
    F: FnMut(&mut Stream) -> Result<(), TaskError> + Send + 'static,
{
    fn fill(&mut self, chunk: &mut Stream) -> Result<(), TaskError> {
        self(chunk)
    }
}

/// Pushes one chunk of `chunk_size` samples into the buffer every
/// `chunk_size / rate` seconds, at the stream's native rate.
pub struct ProducerWorker<S: SampleSource> {
    source: S,
    buffer: Arc<TimeRingBuffer>,
    context: Arc<PipelineContext>,
    chunk: Stream,
    chunk_size: usize,
    timer: PeriodicTimer,
    start_time: f64,
    /// Samples produced since enter
    produced: u64,
}

impl<S: SampleSource> ProducerWorker<S> {
    pub fn new(
        source: S,
        buffer: Arc<TimeRingBuffer>,
        chunk_size: usize,
        context: Arc<PipelineContext>,
    ) -> Result<Self, StageError> {
        if chunk_size == 0 {
            return Err(StageError::config("producer", "chunk size of zero"));
        }
        let config = buffer.config();
        let chunk = Stream::new(
            chunk_size,
            config.channel_count,
            config.element_type,
            config.sample_rate,
            0.0,
        )?;
        let timer = PeriodicTimer::from_secs_f64(chunk_size as f64 / config.sample_rate)
            .map_err(|e| StageError::config("producer", e.to_string()))?;

        Ok(Self {
            source,
            buffer,
            context,
            chunk,
            chunk_size,
            timer,
            start_time: 0.0,
            produced: 0,
        })
    }

    /// Absolute time of the first produced sample
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: SampleSource> Runnable for ProducerWorker<S> {
    fn enter(&mut self, ctx: &WorkerContext) -> Result<(), TaskError> {
        self.produced = 0;
        self.timer.reset();
        debug!(
            "'{}' producing {} samples every {:?}",
            ctx.name(),
            self.chunk_size,
            self.timer.period()
        );
        Ok(())
    }

    fn run(&mut self, ctx: &WorkerContext) -> Result<(), TaskError> {
        let tick = self.timer.wait();
        if tick.lateness > self.timer.period() {
            warn!("'{}' is {:?} behind schedule", ctx.name(), tick.lateness);
        }

        let rate = self.chunk.sample_rate();
        self.chunk.adjust(self.chunk_size);
        self.chunk
            .set_start_time(self.start_time + self.produced as f64 / rate);
        self.source.fill(&mut self.chunk)?;

        let pushed = self.buffer.push_stream(&self.chunk)?;
        self.produced += pushed as u64;
        self.context.record_pushed(pushed);
        Ok(())
    }

    fn flush(&mut self, ctx: &WorkerContext) -> Result<(), TaskError> {
        info!("'{}' produced {} samples", ctx.name(), self.produced);
        Ok(())
    }
}

/// Pulls consecutive, non-overlapping windows of `window_seconds` from the
/// buffer every `period_seconds` and hands them to a [`ConsumerStage`].
///
/// Window `k` covers `[origin + k * window, origin + (k + 1) * window)`.
/// Every wake-up drains all windows that are complete, so a consumer slower
/// than the producer catches up instead of skipping. A window still being
/// written is retried on the next wake-up.
///
/// Aux buffers added with [`with_aux`](Self::with_aux) are read over the
/// same `(time, window)` as the primary, so every delivered aux window
/// covers the primary window's span at the aux stream's own rate.
pub struct ConsumerWorker<C: ConsumerStage> {
    stage: C,
    reader: BufferReader,
    aux_readers: Vec<BufferReader>,
    aux_windows: Vec<Stream>,
    context: Arc<PipelineContext>,
    window_seconds: f64,
    timer: PeriodicTimer,
    window: Stream,
    origin: Option<f64>,
    next_window: u64,
}

impl<C: ConsumerStage> ConsumerWorker<C> {
    pub fn new(
        stage: C,
        buffer: Arc<TimeRingBuffer>,
        window_seconds: f64,
        period_seconds: f64,
        context: Arc<PipelineContext>,
    ) -> Result<Self, StageError> {
        if !window_seconds.is_finite() || window_seconds <= 0.0 {
            return Err(StageError::config(
                stage.name(),
                format!("window of {} s", window_seconds),
            ));
        }
        let timer = PeriodicTimer::from_secs_f64(period_seconds)
            .map_err(|e| StageError::config(stage.name(), e.to_string()))?;
        let config = buffer.config();
        let window = Stream::empty(config.channel_count, config.element_type, config.sample_rate)?;

        Ok(Self {
            stage,
            reader: BufferReader::new(buffer),
            aux_readers: Vec::new(),
            aux_windows: Vec::new(),
            context,
            window_seconds,
            timer,
            window,
            origin: None,
            next_window: 0,
        })
    }

    /// Attach the next aux buffer, matched by position against
    /// [`ConsumerStage::aux_requirements`]
    pub fn with_aux(mut self, buffer: Arc<TimeRingBuffer>) -> Result<Self, StageError> {
        let config = buffer.config();
        let window = Stream::empty(config.channel_count, config.element_type, config.sample_rate)?;
        self.aux_readers.push(BufferReader::new(buffer));
        self.aux_windows.push(window);
        Ok(self)
    }

    pub fn stage(&self) -> &C {
        &self.stage
    }

    pub fn into_stage(self) -> C {
        self.stage
    }

    /// Windows delivered to the stage since enter
    pub fn windows_consumed(&self) -> u64 {
        self.next_window
    }

    /// Deliver every window that can no longer change
    fn drain(&mut self, ctx: &WorkerContext) -> Result<(), StageError> {
        let origin = match self.origin {
            Some(origin) => origin,
            None => match self.reader.buffer().origin() {
                Some(origin) => *self.origin.insert(origin),
                None => return Ok(()),
            },
        };

        while !ctx.should_stop() {
            let time = origin + self.next_window as f64 * self.window_seconds;
            if !self.reader.read(time, self.window_seconds, &mut self.window)? {
                break;
            }
            if !self.read_aux(time)? {
                break;
            }
            let evicted = self.reader.last_result().is_some_and(|r| r.is_evicted());
            if evicted {
                warn!(
                    "'{}' window {} at {:.3}s partly evicted",
                    ctx.name(),
                    self.next_window,
                    time
                );
            }

            if !self.window.is_empty() {
                let info = StageInfo {
                    time: self.window.start_time(),
                    output_len: self.window.len(),
                    frame_index: self.next_window,
                };
                self.stage.consume(&info, &self.window, &self.aux_windows)?;
            }
            self.context.record_window(self.window.len(), evicted);
            self.next_window += 1;
        }
        Ok(())
    }

    /// Read the aux windows for `time`; false while any is still pending
    fn read_aux(&mut self, time: f64) -> Result<bool, StageError> {
        for (reader, window) in self.aux_readers.iter_mut().zip(self.aux_windows.iter_mut()) {
            if !reader.read(time, self.window_seconds, window)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<C: ConsumerStage + 'static> Runnable for ConsumerWorker<C> {
    fn enter(&mut self, _ctx: &WorkerContext) -> Result<(), TaskError> {
        let name = self.stage.name().to_string();
        let shape = self.stage.input_shape();
        validate_inputs(
            &name,
            &shape,
            &self.stage.aux_requirements(),
            &self.window,
            &self.aux_windows,
        )?;
        self.stage.enter(&self.window, &self.aux_windows)?;

        self.origin = None;
        self.next_window = 0;
        self.timer.reset();
        info!("Stage '{}' entered: {} windows of {} s", name, shape, self.window_seconds);
        Ok(())
    }

    fn run(&mut self, ctx: &WorkerContext) -> Result<(), TaskError> {
        self.timer.wait();
        self.drain(ctx)?;
        Ok(())
    }

    fn flush(&mut self, ctx: &WorkerContext) -> Result<(), TaskError> {
        info!("'{}' consumed {} windows", ctx.name(), self.next_window);
        self.stage.flush()?;
        Ok(())
    }
}
