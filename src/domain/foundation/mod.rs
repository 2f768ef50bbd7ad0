//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait, and the
//! validation error vocabulary used by every schema.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub(crate) use errors::{require_count, require_in_range, require_min_items};
pub use ids::RunId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
