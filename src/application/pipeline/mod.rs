//! Pipeline orchestration: Plan -> Research -> Risk -> Opportunity -> Strategize.

mod errors;
mod orchestrator;
mod progress;
mod runner;

pub use errors::PipelineError;
pub use orchestrator::PipelineOrchestrator;
pub use progress::{Checkpoint, ProgressCallback};
pub use runner::PipelineRunner;
