//! ErrorStrategy (spec.md §4.5). A critical error type takes priority over
//! the ordinary error-rate thresholds and signals a near-abort decrease.

use bx_common::{DerivedMetrics, DialAdjustment, GoalEvaluation, GoalStatus};

use crate::Strategy;

#[derive(Debug, Default)]
pub struct ErrorStrategy;

impl Strategy for ErrorStrategy {
    fn propose(&self, evaluation: &GoalEvaluation) -> DialAdjustment {
        let derived = match &evaluation.metrics {
            DerivedMetrics::Error(d) => d,
            _ => return DialAdjustment::no_change("wrong goal kind"),
        };

        if derived.has_critical_error {
            return DialAdjustment::new(-20, -20, "critical error");
        }

        if evaluation.status == GoalStatus::Violated {
            let delta = if derived.error_rate > 0.10 {
                8
            } else if derived.error_rate > 0.07 {
                5
            } else {
                3
            };
            return DialAdjustment::new(-delta, -delta, "error budget violated: reducing load");
        }

        if evaluation.status == GoalStatus::AtRisk {
            let delta = if derived.error_rate > 0.05 { 3 } else { 2 };
            return DialAdjustment::new(-delta, -delta, "error budget at risk: easing off");
        }

        DialAdjustment::no_change("error budget within limits")
    }
}
