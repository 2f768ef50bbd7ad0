//! Application layer - Step execution and pipeline orchestration.
//!
//! This layer coordinates the domain's reasoning steps with the
//! text-generation port. It owns no I/O of its own.

pub mod pipeline;
pub mod steps;

pub use pipeline::{
    Checkpoint, PipelineError, PipelineOrchestrator, PipelineRunner, ProgressCallback,
};
pub use steps::{ExtractionStrategy, StepExecutor};
