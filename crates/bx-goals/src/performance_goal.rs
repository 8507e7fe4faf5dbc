//! PerformanceGoal (spec.md §4.4.1). Severity is always CRITICAL: a
//! violation here is the only status that can trigger a run abort
//! (spec.md §4.6 step 3).
//!
//! The `startTime` anchor open question (spec.md §9) is resolved by
//! anchoring on run-start time: `MetricsSnapshot::elapsed` is already
//! measured from run start (see `bx-metrics::MetricsCollector`), so this
//! goal needs no state of its own — see DESIGN.md decision #1.

use std::time::Duration;

use bx_common::{GoalEvaluation, GoalStatus, MetricsSnapshot, PerformanceDerived, Severity};

use crate::Goal;

#[derive(Debug, Clone, Copy)]
pub struct PerformanceGoalConfig {
    /// Deadline measured from run start.
    pub deadline: Duration,
    pub min_rate_per_minute: f64,
    /// In `(0, 1]`.
    pub tolerance: f64,
}

pub struct PerformanceGoal {
    config: PerformanceGoalConfig,
}

impl PerformanceGoal {
    pub fn new(config: PerformanceGoalConfig) -> Self {
        Self { config }
    }
}

impl Goal for PerformanceGoal {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, snapshot: &MetricsSnapshot) -> GoalEvaluation {
        let deadline_exceeded = snapshot.elapsed >= self.config.deadline;

        let remaining_minutes = if deadline_exceeded {
            0.0
        } else {
            (self.config.deadline - snapshot.elapsed).as_secs_f64() / 60.0
        };

        let remaining_items =
            (snapshot.total_work_items.saturating_sub(snapshot.work_items_processed)) as f64;

        let required_rate = if remaining_minutes > 0.0 {
            self.config
                .min_rate_per_minute
                .max(remaining_items / remaining_minutes)
        } else {
            // Deadline already passed or exactly now: any positive remaining
            // work means an effectively infinite required rate, which keeps
            // the VIOLATED branch correct below without dividing by zero.
            if remaining_items > 0.0 {
                f64::INFINITY
            } else {
                self.config.min_rate_per_minute
            }
        };

        let current_rate = snapshot.files_per_minute;
        let rate_gap = required_rate - current_rate;
        let percent_complete = snapshot.percent_complete();

        let status = if deadline_exceeded {
            GoalStatus::Violated
        } else if current_rate < 0.5 * required_rate {
            GoalStatus::Violated
        } else if current_rate < self.config.tolerance * required_rate {
            GoalStatus::AtRisk
        } else {
            GoalStatus::Met
        };

        GoalEvaluation {
            goal_name: self.name(),
            status,
            severity: self.severity(),
            metrics: bx_common::DerivedMetrics::Performance(PerformanceDerived {
                required_rate,
                current_rate,
                rate_gap,
                percent_complete,
                time_remaining_minutes: remaining_minutes,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn snapshot(elapsed_secs: u64, processed: u64, total: u64, files_per_minute: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            run_id: Uuid::nil(),
            timestamp: chrono::Utc::now(),
            elapsed: Duration::from_secs(elapsed_secs),
            work_items_processed: processed,
            total_work_items: total,
            failed_work_items: 0,
            records_processed: processed * 100,
            files_per_minute,
            records_per_second: 0.0,
            active_db_connections: 0,
            heap_utilization: 0.0,
            total_errors: 0,
            critical_error_types: BTreeSet::new(),
        }
    }

    fn goal() -> PerformanceGoal {
        PerformanceGoal::new(PerformanceGoalConfig {
            deadline: Duration::from_secs(600),
            min_rate_per_minute: 90.0,
            tolerance: 0.8,
        })
    }

    #[test]
    fn violated_when_deadline_exceeded() {
        let eval = goal().evaluate(&snapshot(601, 40, 100, 90.0));
        assert_eq!(eval.status, GoalStatus::Violated);
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn violated_when_current_rate_below_half_required() {
        // 16 items done out of 100 at t=0: scenario 2's AT_RISK case is
        // compared against a stricter case here (below half).
        let eval = goal().evaluate(&snapshot(60, 16, 100, 10.0));
        assert_eq!(eval.status, GoalStatus::Violated);
    }

    #[test]
    fn at_risk_when_below_tolerance_but_above_half() {
        // required_rate is floored at min_rate_per_minute (20 here, with
        // few enough remaining items that the rate/time term doesn't
        // dominate); current_rate=15 sits strictly between 0.5*20=10 and
        // 0.8*20=16, the AT_RISK band from spec.md §4.4.1.
        let lenient = PerformanceGoal::new(PerformanceGoalConfig {
            deadline: Duration::from_secs(600),
            min_rate_per_minute: 20.0,
            tolerance: 0.8,
        });
        let eval = lenient.evaluate(&snapshot(60, 16, 100, 15.0));
        assert_eq!(eval.status, GoalStatus::AtRisk);
        if let bx_common::DerivedMetrics::Performance(derived) = eval.metrics {
            assert!(derived.rate_gap > 0.0);
        } else {
            panic!("expected performance derived metrics");
        }
    }

    #[test]
    fn met_when_rate_exceeds_tolerance_threshold() {
        let eval = goal().evaluate(&snapshot(60, 50, 100, 200.0));
        assert_eq!(eval.status, GoalStatus::Met);
    }

    #[test]
    fn required_rate_is_floor_of_min_rate() {
        // Very little work remains: required rate should not fall below
        // min_rate_per_minute even though remaining_items/remaining_minutes
        // would be tiny.
        let eval = goal().evaluate(&snapshot(60, 99, 100, 95.0));
        if let bx_common::DerivedMetrics::Performance(derived) = eval.metrics {
            assert!(derived.required_rate >= 90.0);
        } else {
            panic!("expected performance derived metrics");
        }
    }
}
