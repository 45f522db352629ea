//! Pipeline configuration

use crate::PipelineError;
use config::{Config, Environment, File};
use ring_buffer::BufferConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stream_model::ElementType;

/// Prefix of environment overrides, e.g. `PIPELINE_PRODUCER_RATE_HZ=100`
pub const ENV_PREFIX: &str = "PIPELINE";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum log level (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Producer sample rate in Hz
    pub producer_rate_hz: f64,

    /// Samples per producer chunk
    pub chunk_size: usize,

    /// Channels per sample
    pub channel_count: usize,

    /// Retained history of the ring buffer in seconds
    pub buffer_capacity_s: f64,

    /// Length of each consumed window in seconds
    pub consumer_window_s: f64,

    /// Consumer wake-up period in seconds
    pub consumer_period_s: f64,

    /// How long the pipeline runs before stopping
    pub run_duration_s: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            producer_rate_hz: 50.0,
            chunk_size: 5,
            channel_count: 1,
            buffer_capacity_s: 10.0,
            consumer_window_s: 1.0,
            consumer_period_s: 1.1,
            run_duration_s: 10.0,
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then the optional TOML file at `path`, then
    /// `PIPELINE_*` environment variables. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        let positive = [
            ("producer_rate_hz", self.producer_rate_hz),
            ("buffer_capacity_s", self.buffer_capacity_s),
            ("consumer_window_s", self.consumer_window_s),
            ("consumer_period_s", self.consumer_period_s),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PipelineError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !self.run_duration_s.is_finite() || self.run_duration_s < 0.0 {
            return Err(PipelineError::Config(format!(
                "run_duration_s must not be negative, got {}",
                self.run_duration_s
            )));
        }
        if self.chunk_size == 0 {
            return Err(PipelineError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.channel_count == 0 {
            return Err(PipelineError::Config("channel_count must be at least 1".to_string()));
        }
        if self.buffer_capacity_s < self.consumer_window_s + self.consumer_period_s {
            return Err(PipelineError::Config(format!(
                "buffer of {} s cannot hold a {} s window polled every {} s",
                self.buffer_capacity_s, self.consumer_window_s, self.consumer_period_s
            )));
        }
        Ok(())
    }

    /// Ring buffer carrying `f32` samples of the configured shape
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            capacity_seconds: self.buffer_capacity_s,
            sample_rate: self.producer_rate_hz,
            channel_count: self.channel_count,
            element_type: ElementType::Float32,
        }
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs_f64(self.run_duration_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.buffer_config().capacity_samples(), 500);
    }

    #[test]
    fn test_rejects_zero_values() {
        let zero_rate = PipelineConfig {
            producer_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(zero_rate.validate(), Err(PipelineError::Config(_))));

        let zero_chunk = PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(zero_chunk.validate().is_err());

        let nan_period = PipelineConfig {
            consumer_period_s: f64::NAN,
            ..Default::default()
        };
        assert!(nan_period.validate().is_err());
    }

    #[test]
    fn test_rejects_buffer_shorter_than_polling() {
        let config = PipelineConfig {
            buffer_capacity_s: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
