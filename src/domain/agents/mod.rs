//! Structured reasoning steps.
//!
//! The five pipeline steps form a closed set: [`StepKind`] names them,
//! [`StepRequest`] carries each one's borrowed inputs and renders its prompt,
//! and [`StepOutput`] carries its typed result. Recovery of typed results from
//! free text lives in `extraction`.

mod errors;
pub mod extraction;
mod prompts;
mod step;

pub use errors::{excerpt, StepError, RAW_EXCERPT_CHARS};
pub use extraction::extract_structured;
pub use prompts::system_prompt_for_step;
pub use step::{StepKind, StepOutput, StepRequest};
