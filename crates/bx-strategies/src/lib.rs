//! Strategies (C5): pure evaluators mapping a `GoalEvaluation` to a
//! `DialAdjustment`. Like `bx-goals`, no strategy here mutates shared state
//! or reads anything beyond the evaluation it is given (spec.md §5).

pub mod error_strategy;
pub mod noop_strategy;
pub mod performance_strategy;
pub mod resource_strategy;

pub use error_strategy::ErrorStrategy;
pub use noop_strategy::NoOpStrategy;
pub use performance_strategy::PerformanceStrategy;
pub use resource_strategy::ResourceStrategy;

use bx_common::{DialAdjustment, GoalEvaluation};

/// One strategy per goal; sign convention is positive = increase dials,
/// negative = decrease dials (spec.md §4.5).
pub trait Strategy: Send + Sync {
    fn propose(&self, evaluation: &GoalEvaluation) -> DialAdjustment;
}
