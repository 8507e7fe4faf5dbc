//! ErrorGoal (spec.md §4.4.3). Severity is HIGH: even a critical error type
//! only drives a concurrency decrease through this goal, it does not abort
//! the run on its own (only a CRITICAL-severity PerformanceGoal violation
//! does that — see DESIGN.md decision #2).

use std::collections::BTreeSet;

use bx_common::{ErrorDerived, GoalEvaluation, GoalStatus, MetricsSnapshot, Severity};

use crate::Goal;

#[derive(Debug, Clone)]
pub struct ErrorGoalConfig {
    /// Reserved for a future per-file error rate check; not evaluated today
    /// (see DESIGN.md decision #3).
    pub max_error_rate_per_file: f64,
    pub max_total_error_count: u64,
    pub critical_error_types: BTreeSet<String>,
}

pub struct ErrorGoal {
    config: ErrorGoalConfig,
}

impl ErrorGoal {
    pub fn new(config: ErrorGoalConfig) -> Self {
        Self { config }
    }
}

const AT_RISK_FACTOR: f64 = 0.7;

impl Goal for ErrorGoal {
    fn name(&self) -> &'static str {
        "error"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, snapshot: &MetricsSnapshot) -> GoalEvaluation {
        let has_critical_error = snapshot.has_critical_error_of(&self.config.critical_error_types);
        let total_errors = snapshot.total_errors;

        let count_violated = total_errors > self.config.max_total_error_count;
        let count_at_risk =
            total_errors as f64 > AT_RISK_FACTOR * self.config.max_total_error_count as f64;

        let status = if has_critical_error || count_violated {
            GoalStatus::Violated
        } else if count_at_risk {
            GoalStatus::AtRisk
        } else {
            GoalStatus::Met
        };

        let error_budget_remaining =
            self.config.max_total_error_count as i64 - total_errors as i64;

        GoalEvaluation {
            goal_name: self.name(),
            status,
            severity: self.severity(),
            metrics: bx_common::DerivedMetrics::Error(ErrorDerived {
                total_errors,
                error_rate: snapshot.error_rate(),
                error_budget_remaining,
                failed_files: snapshot.failed_work_items,
                has_critical_error,
            }),
        }
    }
}
