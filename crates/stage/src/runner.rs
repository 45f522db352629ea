//! Transform stage driver

use crate::contract::{check_alignment, validate_inputs};
use crate::{StageError, StageInfo, TransformStage};
use stream_model::Stream;
use tracing::{debug, info};

/// Drives a [`TransformStage`]: validates shapes at enter, owns the output
/// stream, and checks the produced count after every chunk.
pub struct TransformRunner<S: TransformStage> {
    stage: S,
    output: Option<Stream>,
    frame_index: u64,
}

impl<S: TransformStage> TransformRunner<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            output: None,
            frame_index: 0,
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn is_entered(&self) -> bool {
        self.output.is_some()
    }

    /// Chunks processed since enter
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Validate `input` (a chunk or an empty template of the primary
    /// stream) and `aux` against the stage's declarations, allocate the
    /// output stream and call the stage's `enter`. Nothing is processed if
    /// this fails.
    pub fn enter(&mut self, input: &Stream, aux: &[Stream]) -> Result<(), StageError> {
        let name = self.stage.name().to_string();
        let shape = self.stage.input_shape();
        validate_inputs(&name, &shape, &self.stage.aux_requirements(), input, aux)?;
        self.stage.conversion().check_chunk(&name, 0)?;

        let out_shape = self.stage.output_shape();
        let output = out_shape.empty_stream()?;
        self.stage.enter(input, &output, aux)?;

        info!("Stage '{}' entered: {} -> {}", name, shape, out_shape);
        self.output = Some(output);
        self.frame_index = 0;
        Ok(())
    }

    /// Run one chunk through the stage, returning its output
    pub fn process(&mut self, input: &Stream, aux: &[Stream]) -> Result<&Stream, StageError> {
        let name = self.stage.name();
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| StageError::NotEntered(name.to_string()))?;

        self.stage.input_shape().check(name, "input", input)?;
        check_alignment(name, input, aux)?;
        let conversion = self.stage.conversion();
        conversion.check_chunk(name, input.len())?;

        let expected = conversion.expected_output(input.len());
        output.adjust(expected);
        // No values from the previous chunk may leak into this one
        output.zero();
        output.set_start_time(input.start_time());

        let info = StageInfo {
            time: input.start_time(),
            output_len: expected,
            frame_index: self.frame_index,
        };
        self.stage.process(&info, input, output, aux)?;

        if output.len() != expected {
            return Err(StageError::OutputCount {
                stage: self.stage.name().to_string(),
                expected,
                actual: output.len(),
            });
        }
        self.frame_index += 1;
        Ok(output)
    }

    /// Release the stage's working state and the output stream
    pub fn flush(&mut self) -> Result<(), StageError> {
        if self.output.take().is_none() {
            return Err(StageError::NotEntered(self.stage.name().to_string()));
        }
        debug!("Stage '{}' flushed after {} chunks", self.stage.name(), self.frame_index);
        self.stage.flush()
    }

    pub fn into_inner(self) -> S {
        self.stage
    }
}
