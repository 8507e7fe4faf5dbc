//! Goals (C4): pure evaluators mapping a `MetricsSnapshot` to a
//! `GoalEvaluation`. No goal here mutates shared state or reads anything
//! outside the snapshot it is given (spec.md §5: "strategies and goals must
//! be pure").

pub mod error_goal;
pub mod performance_goal;
pub mod resource_goal;

pub use error_goal::{ErrorGoal, ErrorGoalConfig};
pub use performance_goal::{PerformanceGoal, PerformanceGoalConfig};
pub use resource_goal::{ResourceGoal, ResourceGoalConfig};

use bx_common::{GoalEvaluation, MetricsSnapshot, Severity};

/// A goal carries a fixed severity and evaluates a snapshot into a
/// `GoalEvaluation`. Implementations must be pure functions of their input.
pub trait Goal: Send + Sync {
    fn name(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn evaluate(&self, snapshot: &MetricsSnapshot) -> GoalEvaluation;
}
