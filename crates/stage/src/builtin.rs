//! Built-in stages

use crate::{RateConversion, StageError, StageInfo, StreamShape, TransformStage};
use stream_model::Stream;

/// Keeps the first sample of every `factor` input samples, all channels.
/// Works on raw bytes, so any element type is accepted.
pub struct Downsample {
    name: String,
    input: StreamShape,
    factor: usize,
}

impl Downsample {
    pub fn new(input: StreamShape, factor: usize) -> Self {
        Self {
            name: format!("downsample/{}", factor),
            input,
            factor,
        }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }
}

impl TransformStage for Downsample {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> StreamShape {
        self.input
    }

    fn conversion(&self) -> RateConversion {
        RateConversion::Decimate(self.factor)
    }

    fn process(
        &mut self,
        info: &StageInfo,
        input: &Stream,
        output: &mut Stream,
        _aux: &[Stream],
    ) -> Result<(), StageError> {
        let fb = input.frame_bytes();
        let src = input.bytes();
        let dst = output.bytes_mut();
        for i in 0..info.output_len {
            let from = i * self.factor * fb;
            dst[i * fb..(i + 1) * fb].copy_from_slice(&src[from..from + fb]);
        }
        Ok(())
    }
}
