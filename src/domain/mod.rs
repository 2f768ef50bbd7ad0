//! Domain layer containing the pipeline's types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, state machine, validation errors)
//! - `schemas` - Typed step outputs and the shared analysis state
//! - `agents` - The five reasoning steps, their prompts and result extraction
//! - `scoring` - Deterministic aggregation and score validation

pub mod agents;
pub mod foundation;
pub mod schemas;
pub mod scoring;
