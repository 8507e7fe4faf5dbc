//! NoOpStrategy (spec.md §4.5): returns no change regardless of evaluation.
//! Used for observability-only goals or disabled strategies.

use bx_common::{DialAdjustment, GoalEvaluation};

use crate::Strategy;

#[derive(Debug, Default)]
pub struct NoOpStrategy;

impl Strategy for NoOpStrategy {
    fn propose(&self, _evaluation: &GoalEvaluation) -> DialAdjustment {
        DialAdjustment::no_change("no change")
    }
}
