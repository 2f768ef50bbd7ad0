//! Execution of single reasoning steps.

mod executor;

pub use executor::{ExtractionStrategy, StepExecutor};
