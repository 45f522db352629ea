//! Pipeline composition

use crate::{PipelineConfig, PipelineError, SineSource, WindowSummary};
use ring_buffer::TimeRingBuffer;
use serde::Serialize;
use stage::{ConsumerWorker, ContextSnapshot, PipelineContext, ProducerWorker};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use worker::Worker;

/// Frequency of the synthetic producer signal
const SIGNAL_HZ: f64 = 1.0;

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub counters: ContextSnapshot,
    /// Pushed samples never delivered to the consumer (tail still pending
    /// or lost to eviction)
    pub undelivered: u64,
    pub evicted: u64,
}

/// One producer and one tiling consumer around a shared ring buffer
pub struct Pipeline {
    config: PipelineConfig,
    context: Arc<PipelineContext>,
    buffer: Arc<TimeRingBuffer>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let buffer = Arc::new(TimeRingBuffer::new(config.buffer_config())?);
        Ok(Self {
            config,
            context: Arc::new(PipelineContext::new()),
            buffer,
        })
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.context
    }

    pub fn buffer(&self) -> &Arc<TimeRingBuffer> {
        &self.buffer
    }

    /// Run for the configured duration
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        self.run_for(self.config.run_duration())
    }

    /// Start both workers, let them run for `duration`, then stop the
    /// consumer before the producer
    pub fn run_for(&self, duration: Duration) -> Result<RunSummary, PipelineError> {
        let cfg = &self.config;
        let started = Instant::now();

        let producer = ProducerWorker::new(
            SineSource::new(SIGNAL_HZ, 1.0),
            Arc::clone(&self.buffer),
            cfg.chunk_size,
            Arc::clone(&self.context),
        )?;
        let consumer = ConsumerWorker::new(
            WindowSummary::new(cfg.channel_count, cfg.producer_rate_hz),
            Arc::clone(&self.buffer),
            cfg.consumer_window_s,
            cfg.consumer_period_s,
            Arc::clone(&self.context),
        )?;

        let monitor = self.context.monitor();
        let mut producer = Worker::new("producer", producer).with_monitor(monitor);
        let mut consumer = Worker::new("consumer", consumer).with_monitor(monitor);

        producer.start()?;
        if let Err(e) = consumer.start() {
            producer.stop()?;
            return Err(e.into());
        }

        std::thread::sleep(duration);
        info!("Worker status:\n{}", monitor);

        let consumer_result = consumer.stop();
        let producer_result = producer.stop();
        let consumer_report = consumer_result?;
        let producer_report = producer_result?;
        info!(
            "{} ran {} cycles, {} ran {} cycles",
            producer_report.name, producer_report.cycles, consumer_report.name, consumer_report.cycles
        );

        let counters = self.context.snapshot();
        let summary = RunSummary {
            elapsed: started.elapsed(),
            undelivered: counters.samples_pushed.saturating_sub(counters.samples_consumed),
            evicted: self.buffer.total_evicted(),
            counters,
        };
        if counters.windows_partial > 0 {
            warn!("{} windows were partly evicted", counters.windows_partial);
        }
        info!(
            "Pushed {} samples, delivered {} in {} windows, {} undelivered",
            counters.samples_pushed, counters.samples_consumed, counters.windows_consumed, summary.undelivered
        );
        Ok(summary)
    }
}
