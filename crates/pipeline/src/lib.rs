//! Signal Pipeline
//!
//! Composes a paced producer and a tiling consumer around one
//! time-indexed ring buffer, with file/environment configuration and
//! `tracing` logging.

mod demo;
mod error;
mod logging;
mod runner;
mod settings;

pub use demo::{SineSource, WindowSummary};
pub use error::PipelineError;
pub use logging::init_logging;
pub use runner::{Pipeline, RunSummary};
pub use settings::PipelineConfig;

pub use stage::{ContextSnapshot, PipelineContext};
