//! Error taxonomy for the engine (spec.md §7). `TransientItem` and `Batch`
//! are item-local and never abort a run by themselves; `InvariantViolation`
//! is fatal and triggers `Engine::abort`; `Cancelled` is returned by gate
//! acquisitions once a run is aborting.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("work item failed: {0}")]
    TransientItem(String),

    #[error("batch processing failed: {0}")]
    Batch(String),

    #[error("engine invariant violated: {0}")]
    InvariantViolation(String),

    #[error("run was cancelled")]
    Cancelled,
}

impl From<bx_gates::GateError> for EngineError {
    fn from(_: bx_gates::GateError) -> Self {
        EngineError::Cancelled
    }
}
