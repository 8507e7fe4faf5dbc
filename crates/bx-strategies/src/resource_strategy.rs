//! ResourceStrategy (spec.md §4.5).

use bx_common::{DerivedMetrics, DialAdjustment, GoalEvaluation, GoalStatus};

use crate::Strategy;

#[derive(Debug, Default)]
pub struct ResourceStrategy;

impl Strategy for ResourceStrategy {
    fn propose(&self, evaluation: &GoalEvaluation) -> DialAdjustment {
        let derived = match &evaluation.metrics {
            DerivedMetrics::Resource(d) => d,
            _ => return DialAdjustment::no_change("wrong goal kind"),
        };

        let max_utilization = derived.db_utilization_percent.max(derived.heap_utilization_percent);

        if evaluation.status == GoalStatus::Violated {
            let delta = if max_utilization > 95.0 {
                8
            } else if max_utilization > 90.0 {
                5
            } else {
                3
            };
            return DialAdjustment::new(-delta, -delta, "resource violated: reducing load");
        }

        if evaluation.status == GoalStatus::AtRisk || derived.connection_pressure {
            let delta = if max_utilization > 88.0 { 3 } else { 2 };
            return DialAdjustment::new(-delta, -delta, "resource under pressure: easing off");
        }

        DialAdjustment::no_change("resource within limits")
    }
}
