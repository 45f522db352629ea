//! Stream shapes and rate conversions declared by stages

use crate::StageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use stream_model::{ElementType, Stream, StreamError};

/// Channel count, element type and sample rate of a stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamShape {
    pub channel_count: usize,
    pub element_type: ElementType,
    pub sample_rate: f64,
}

impl StreamShape {
    pub fn new(channel_count: usize, element_type: ElementType, sample_rate: f64) -> Self {
        Self {
            channel_count,
            element_type,
            sample_rate,
        }
    }

    /// Shape of an existing stream
    pub fn of(stream: &Stream) -> Self {
        Self::new(stream.channel_count(), stream.element_type(), stream.sample_rate())
    }

    /// Allocate an empty stream of this shape
    pub fn empty_stream(&self) -> Result<Stream, StreamError> {
        Stream::empty(self.channel_count, self.element_type, self.sample_rate)
    }

    /// Same shape with the rate converted
    pub fn converted(&self, conversion: RateConversion) -> Self {
        Self {
            sample_rate: conversion.output_rate(self.sample_rate),
            ..*self
        }
    }

    /// Check `stream` against this shape. `what` names the stream in the
    /// error ("input", "aux 0", ...).
    pub fn check(&self, stage: &str, what: &str, stream: &Stream) -> Result<(), StageError> {
        let actual = Self::of(stream);
        if actual.channel_count != self.channel_count {
            return Err(StageError::config(
                stage,
                format!(
                    "{} has {} channels, declared {}",
                    what, actual.channel_count, self.channel_count
                ),
            ));
        }
        if actual.element_type != self.element_type {
            return Err(StageError::config(
                stage,
                format!(
                    "{} holds {}, declared {}",
                    what, actual.element_type, self.element_type
                ),
            ));
        }
        if (actual.sample_rate - self.sample_rate).abs() > 1e-9 * self.sample_rate.abs().max(1.0) {
            return Err(StageError::config(
                stage,
                format!(
                    "{} runs at {} Hz, declared {} Hz",
                    what, actual.sample_rate, self.sample_rate
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for StreamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {} Hz", self.channel_count, self.element_type, self.sample_rate)
    }
}

/// How a transform stage maps input samples to output samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateConversion {
    /// One output sample per input sample
    PassThrough,
    /// One output sample per `n` input samples
    Decimate(usize),
    /// `n` output samples per input sample
    Interpolate(usize),
}

impl RateConversion {
    /// Output samples produced for `input_len` input samples
    pub fn expected_output(&self, input_len: usize) -> usize {
        match *self {
            Self::PassThrough => input_len,
            Self::Decimate(n) => input_len / n.max(1),
            Self::Interpolate(n) => input_len * n,
        }
    }

    pub fn output_rate(&self, input_rate: f64) -> f64 {
        match *self {
            Self::PassThrough => input_rate,
            Self::Decimate(n) => input_rate / n.max(1) as f64,
            Self::Interpolate(n) => input_rate * n as f64,
        }
    }

    /// Reject factors of zero and chunks a decimator cannot split evenly
    pub fn check_chunk(&self, stage: &str, input_len: usize) -> Result<(), StageError> {
        match *self {
            Self::Decimate(0) | Self::Interpolate(0) => {
                Err(StageError::config(stage, "rate conversion factor of zero"))
            }
            Self::Decimate(n) if input_len % n != 0 => Err(StageError::ChunkSize {
                stage: stage.to_string(),
                len: input_len,
                factor: n,
            }),
            _ => Ok(()),
        }
    }
}

/// An auxiliary input a stage expects, by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxRequirement {
    pub name: String,
    pub channel_count: usize,
    pub element_type: ElementType,
    /// Missing optional streams are accepted
    pub required: bool,
}

impl AuxRequirement {
    pub fn required(name: impl Into<String>, channel_count: usize, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            channel_count,
            element_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, channel_count: usize, element_type: ElementType) -> Self {
        Self {
            required: false,
            ..Self::required(name, channel_count, element_type)
        }
    }

    /// Aux streams may run at their own rate; only channels and type are
    /// fixed.
    pub(crate) fn check(&self, stage: &str, stream: Option<&Stream>) -> Result<(), StageError> {
        let Some(stream) = stream else {
            if self.required {
                return Err(StageError::config(
                    stage,
                    format!("required aux stream '{}' is missing", self.name),
                ));
            }
            return Ok(());
        };
        if stream.channel_count() != self.channel_count || stream.element_type() != self.element_type {
            return Err(StageError::config(
                stage,
                format!(
                    "aux stream '{}' is {}x{}, declared {}x{}",
                    self.name,
                    stream.channel_count(),
                    stream.element_type(),
                    self.channel_count,
                    self.element_type
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_check_reports_channel_mismatch() {
        let shape = StreamShape::new(2, ElementType::Float32, 100.0);
        let mono = Stream::empty(1, ElementType::Float32, 100.0).unwrap();
        let err = shape.check("mixer", "input", &mono).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("1 channels, declared 2"));
    }

    #[test]
    fn test_check_accepts_matching_stream() {
        let stream = Stream::empty(3, ElementType::Int16, 250.0).unwrap();
        StreamShape::of(&stream).check("s", "input", &stream).unwrap();
    }

    #[test]
    fn test_conversion_rates() {
        assert_eq!(RateConversion::Decimate(4).output_rate(100.0), 25.0);
        assert_eq!(RateConversion::Interpolate(3).output_rate(100.0), 300.0);
        assert_eq!(RateConversion::PassThrough.expected_output(17), 17);
    }

    #[test]
    fn test_check_chunk() {
        assert!(RateConversion::Decimate(4).check_chunk("d", 12).is_ok());
        assert!(matches!(
            RateConversion::Decimate(4).check_chunk("d", 10),
            Err(StageError::ChunkSize { len: 10, factor: 4, .. })
        ));
        assert!(RateConversion::Interpolate(0).check_chunk("i", 3).unwrap_err().is_config());
    }

    #[test]
    fn test_aux_requirements() {
        let req = AuxRequirement::required("imu", 3, ElementType::Float32);
        assert!(req.check("fusion", None).unwrap_err().is_config());
        assert!(AuxRequirement::optional("gps", 2, ElementType::Float64)
            .check("fusion", None)
            .is_ok());

        let wrong = Stream::empty(3, ElementType::Float64, 50.0).unwrap();
        assert!(req.check("fusion", Some(&wrong)).is_err());
    }

    proptest! {
        #[test]
        fn prop_conversion_preserves_duration(chunks in 1usize..200, n in 1usize..8) {
            // Output duration equals input duration for whole chunks
            let input_len = chunks * n;
            for conv in [RateConversion::PassThrough, RateConversion::Decimate(n), RateConversion::Interpolate(n)] {
                let out = conv.expected_output(input_len) as f64 / conv.output_rate(100.0);
                let inp = input_len as f64 / 100.0;
                prop_assert!((out - inp).abs() < 1e-9);
            }
        }
    }
}
