//! Synthetic source and summarising consumer used by the binary

use stage::{ConsumerStage, SampleSource, StageError, StageInfo, StreamShape};
use std::f64::consts::TAU;
use stream_model::{ElementType, Stream};
use tracing::debug;
use worker::TaskError;

/// Sine wave per channel, each channel a quarter period behind the last
pub struct SineSource {
    frequency_hz: f64,
    amplitude: f32,
}

impl SineSource {
    pub fn new(frequency_hz: f64, amplitude: f32) -> Self {
        Self {
            frequency_hz,
            amplitude,
        }
    }
}

impl SampleSource for SineSource {
    fn fill(&mut self, chunk: &mut Stream) -> Result<(), TaskError> {
        let channels = chunk.channel_count();
        let rate = chunk.sample_rate();
        let start = chunk.start_time();
        let values = chunk.as_mut_slice::<f32>()?;
        for (i, frame) in values.chunks_exact_mut(channels).enumerate() {
            let t = start + i as f64 / rate;
            for (c, v) in frame.iter_mut().enumerate() {
                let phase = TAU * self.frequency_hz * t - c as f64 * TAU / 4.0;
                *v = self.amplitude * phase.sin() as f32;
            }
        }
        Ok(())
    }
}

/// Per-channel mean of every window it receives
pub struct WindowSummary {
    shape: StreamShape,
    windows: u64,
    samples: u64,
    last_mean: Vec<f64>,
}

impl WindowSummary {
    pub fn new(channel_count: usize, sample_rate: f64) -> Self {
        Self {
            shape: StreamShape::new(channel_count, ElementType::Float32, sample_rate),
            windows: 0,
            samples: 0,
            last_mean: Vec::new(),
        }
    }

    pub fn windows(&self) -> u64 {
        self.windows
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Channel means of the latest window
    pub fn last_mean(&self) -> &[f64] {
        &self.last_mean
    }
}

impl ConsumerStage for WindowSummary {
    fn name(&self) -> &str {
        "window-summary"
    }

    fn input_shape(&self) -> StreamShape {
        self.shape
    }

    fn enter(&mut self, _input: &Stream, _aux: &[Stream]) -> Result<(), StageError> {
        self.last_mean = vec![0.0; self.shape.channel_count];
        Ok(())
    }

    fn consume(&mut self, info: &StageInfo, input: &Stream, _aux: &[Stream]) -> Result<(), StageError> {
        let channels = input.channel_count();
        self.last_mean.iter_mut().for_each(|m| *m = 0.0);
        for frame in input.as_slice::<f32>()?.chunks_exact(channels) {
            for (m, v) in self.last_mean.iter_mut().zip(frame) {
                *m += f64::from(*v);
            }
        }
        let n = input.len().max(1) as f64;
        self.last_mean.iter_mut().for_each(|m| *m /= n);

        self.windows += 1;
        self.samples += input.len() as u64;
        debug!(
            "window {} at {:.3}s: {} samples, mean {:?}",
            info.frame_index,
            info.time,
            input.len(),
            self.last_mean
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StageError> {
        self.last_mean.clear();
        Ok(())
    }
}
