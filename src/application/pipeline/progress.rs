//! Progress notification for long-running pipeline runs.
//!
//! Callbacks are best effort: a panicking callback is logged and the run
//! carries on.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::domain::agents::StepKind;

/// Receives a label and a percentage as each step completes.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, label: &str, percent: u8);
}

impl<F> ProgressCallback for F
where
    F: Fn(&str, u8) + Send + Sync,
{
    fn on_progress(&self, label: &str, percent: u8) {
        self(label, percent)
    }
}

/// A fixed progress report emitted when a step completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub label: &'static str,
    pub percent: u8,
}

impl Checkpoint {
    /// Report emitted once `kind` has completed; the label names what runs next.
    pub fn after(kind: StepKind) -> Self {
        let (label, percent) = match kind {
            StepKind::Plan => ("Step 2/5: Researching context...", 30),
            StepKind::Research => ("Step 3/5: Analyzing risks...", 50),
            StepKind::Risk => ("Step 4/5: Identifying opportunities...", 70),
            StepKind::Opportunity => ("Step 5/5: Synthesizing recommendation...", 85),
            StepKind::Strategize => ("Complete!", 100),
        };
        Self { label, percent }
    }
}

/// Invokes the callback, containing any panic it raises.
pub(crate) fn notify(callback: Option<&dyn ProgressCallback>, checkpoint: Checkpoint) {
    let Some(callback) = callback else {
        return;
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        callback.on_progress(checkpoint.label, checkpoint.percent)
    }));
    if outcome.is_err() {
        warn!(percent = checkpoint.percent, "progress callback panicked");
    }
}
