//! Stage traits

use crate::{AuxRequirement, RateConversion, StageError, StreamShape};
use serde::{Deserialize, Serialize};
use stream_model::Stream;

/// Per-chunk information handed to `process` / `consume`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    /// Absolute time of the first input sample
    pub time: f64,
    /// Output samples the stage must produce (input length for consumers)
    pub output_len: usize,
    /// Chunks delivered so far
    pub frame_index: u64,
}

/// Stage that turns a primary input chunk into an output chunk.
///
/// Shapes are checked by [`TransformRunner`](crate::TransformRunner)
/// before `enter`; `process` must fill exactly `info.output_len` samples.
pub trait TransformStage: Send {
    fn name(&self) -> &str;

    fn input_shape(&self) -> StreamShape;

    fn conversion(&self) -> RateConversion {
        RateConversion::PassThrough
    }

    fn output_shape(&self) -> StreamShape {
        self.input_shape().converted(self.conversion())
    }

    fn aux_requirements(&self) -> Vec<AuxRequirement> {
        Vec::new()
    }

    /// Allocate working state. Streams have already been validated.
    fn enter(&mut self, _input: &Stream, _output: &Stream, _aux: &[Stream]) -> Result<(), StageError> {
        Ok(())
    }

    /// Transform one input chunk.
    ///
    /// `output` arrives sized to `info.output_len` with every sample zeroed.
    /// The runner rejects a chunk whose output length changed, but it cannot
    /// tell a sample left at zero from one written as zero.
    fn process(
        &mut self,
        info: &StageInfo,
        input: &Stream,
        output: &mut Stream,
        aux: &[Stream],
    ) -> Result<(), StageError>;

    fn flush(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}

/// Stage at the end of a pipeline that only reads windows
pub trait ConsumerStage: Send {
    fn name(&self) -> &str;

    fn input_shape(&self) -> StreamShape;

    fn aux_requirements(&self) -> Vec<AuxRequirement> {
        Vec::new()
    }

    fn enter(&mut self, _input: &Stream, _aux: &[Stream]) -> Result<(), StageError> {
        Ok(())
    }

    fn consume(&mut self, info: &StageInfo, input: &Stream, aux: &[Stream]) -> Result<(), StageError>;

    fn flush(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}

/// Validate the primary input and every declared aux stream
pub(crate) fn validate_inputs(
    stage: &str,
    shape: &StreamShape,
    requirements: &[AuxRequirement],
    input: &Stream,
    aux: &[Stream],
) -> Result<(), StageError> {
    shape.check(stage, "input", input)?;
    for (i, req) in requirements.iter().enumerate() {
        req.check(stage, aux.get(i))?;
    }
    if aux.len() > requirements.len() {
        return Err(StageError::config(
            stage,
            format!(
                "{} aux streams supplied, {} declared",
                aux.len(),
                requirements.len()
            ),
        ));
    }
    Ok(())
}

/// Aux chunks must start within half a primary sample of the input
pub(crate) fn check_alignment(stage: &str, input: &Stream, aux: &[Stream]) -> Result<(), StageError> {
    let tolerance = 0.5 / input.sample_rate();
    for (index, stream) in aux.iter().enumerate() {
        if (stream.start_time() - input.start_time()).abs() > tolerance {
            return Err(StageError::Misaligned {
                stage: stage.to_string(),
                index,
                expected: input.start_time(),
                actual: stream.start_time(),
            });
        }
    }
    Ok(())
}
