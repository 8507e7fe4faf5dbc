//! PerformanceStrategy (spec.md §4.5).

use bx_common::{DerivedMetrics, DialAdjustment, GoalEvaluation, GoalStatus};

use crate::Strategy;

#[derive(Debug, Default)]
pub struct PerformanceStrategy;

fn violated_cap(percent_complete: f64) -> i32 {
    if percent_complete < 25.0 {
        10
    } else if percent_complete < 50.0 {
        8
    } else {
        5
    }
}

impl Strategy for PerformanceStrategy {
    fn propose(&self, evaluation: &GoalEvaluation) -> DialAdjustment {
        let derived = match &evaluation.metrics {
            DerivedMetrics::Performance(d) => d,
            _ => return DialAdjustment::no_change("wrong goal kind"),
        };

        match evaluation.status {
            GoalStatus::Violated => {
                let cap = violated_cap(derived.percent_complete);
                let delta = (derived.rate_gap / 2.0).ceil() as i32;
                let delta = delta.clamp(1, cap);
                DialAdjustment::new(delta, delta, "performance violated: increasing throughput")
            }
            GoalStatus::AtRisk => {
                let delta = (derived.rate_gap / 3.0).ceil() as i32;
                let delta = delta.clamp(1, 5);
                DialAdjustment::new(delta, delta, "performance at risk: moderate increase")
            }
            GoalStatus::Met
                if derived.percent_complete < 80.0 && derived.rate_gap < -5.0 =>
            {
                DialAdjustment::new(2, 1, "performance comfortably ahead: tiny buffer increase")
            }
            _ => DialAdjustment::no_change("performance on track"),
        }
    }
}
