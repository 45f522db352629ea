//! Pipeline Stage Contract
//!
//! Stages declare the shape of the streams they accept and produce, are
//! validated once at `enter`, then process one chunk (transform) or one
//! window (consumer) at a time. Workers in this crate connect sources and
//! consumer stages to a [`TimeRingBuffer`](ring_buffer::TimeRingBuffer).

mod builtin;
mod context;
mod contract;
mod error;
mod reader;
mod runner;
mod shape;
mod workers;

pub use builtin::Downsample;
pub use context::{ContextSnapshot, PipelineContext};
pub use contract::{ConsumerStage, StageInfo, TransformStage};
pub use error::StageError;
pub use reader::BufferReader;
pub use runner::TransformRunner;
pub use shape::{AuxRequirement, RateConversion, StreamShape};
pub use workers::{ConsumerWorker, ProducerWorker, SampleSource};
