//! State machine trait for step and status enums.
//!
//! Gives every lifecycle enum the same vocabulary for validating and
//! performing transitions. The pipeline step marker is the main implementor.

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors define the valid edges; validated transitions and terminal
/// detection come for free.
///
/// # Example
///
/// ```ignore
/// let next = PipelineStep::PlannerComplete.transition_to(PipelineStep::ResearchComplete)?;
/// assert!(PipelineStep::Complete.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
