//! ResourceGoal (spec.md §4.4.2). Severity is HIGH: a resource violation
//! drives a concurrency decrease but never aborts a run by itself
//! (spec.md §4.6 step 3 only checks PerformanceGoal for CRITICAL).

use bx_common::{GoalEvaluation, GoalStatus, MetricsSnapshot, ResourceDerived, Severity};

use crate::Goal;

#[derive(Debug, Clone, Copy)]
pub struct ResourceGoalConfig {
    pub max_db_connections: u32,
    /// Fraction of `max_db_connections` considered the hard ceiling.
    pub max_db_utilization: f64,
    /// Fraction of heap considered the hard ceiling.
    pub max_heap_utilization: f64,
}

pub struct ResourceGoal {
    config: ResourceGoalConfig,
}

impl ResourceGoal {
    pub fn new(config: ResourceGoalConfig) -> Self {
        Self { config }
    }
}

const AT_RISK_FACTOR: f64 = 0.85;

impl Goal for ResourceGoal {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, snapshot: &MetricsSnapshot) -> GoalEvaluation {
        let max_connections = self.config.max_db_connections.max(1) as f64;
        let db_utilization = snapshot.active_db_connections as f64 / max_connections;
        let heap_utilization = snapshot.heap_utilization;

        let safe_max_connections =
            (self.config.max_db_connections as f64 * self.config.max_db_utilization).floor() as u32;
        let available_connections =
            safe_max_connections.saturating_sub(snapshot.active_db_connections);

        let db_violated = db_utilization > self.config.max_db_utilization;
        let heap_violated = heap_utilization > self.config.max_heap_utilization;

        let db_at_risk = db_utilization > AT_RISK_FACTOR * self.config.max_db_utilization;
        let heap_at_risk = heap_utilization > AT_RISK_FACTOR * self.config.max_heap_utilization;

        let status = if db_violated || heap_violated {
            GoalStatus::Violated
        } else if db_at_risk || heap_at_risk {
            GoalStatus::AtRisk
        } else {
            GoalStatus::Met
        };

        GoalEvaluation {
            goal_name: self.name(),
            status,
            severity: self.severity(),
            metrics: bx_common::DerivedMetrics::Resource(ResourceDerived {
                db_utilization_percent: db_utilization * 100.0,
                active_connections: snapshot.active_db_connections,
                available_connections,
                safe_max_connections,
                heap_utilization_percent: heap_utilization * 100.0,
                // AT_RISK-or-worse on the DB axis specifically (spec.md §4.4.2),
                // not the overall status, which also folds in the heap axis.
                connection_pressure: db_violated || db_at_risk,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use uuid::Uuid;

    fn snapshot(active_db_connections: u32, heap_utilization: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            run_id: Uuid::nil(),
            timestamp: chrono::Utc::now(),
            elapsed: Duration::from_secs(60),
            work_items_processed: 10,
            total_work_items: 100,
            failed_work_items: 0,
            records_processed: 1000,
            files_per_minute: 10.0,
            records_per_second: 10.0,
            active_db_connections,
            heap_utilization,
            total_errors: 0,
            critical_error_types: BTreeSet::new(),
        }
    }

    fn goal() -> ResourceGoal {
        ResourceGoal::new(ResourceGoalConfig {
            max_db_connections: 100,
            max_db_utilization: 0.8,
            max_heap_utilization: 0.9,
        })
    }

    #[test]
    fn violated_when_db_utilization_exceeds_max() {
        // spec.md §8 scenario 3: maxDbConnections=100, maxDbUtilization=0.8,
        // activeDbConnections=92, heapUtilization=0.5 => VIOLATED.
        let eval = goal().evaluate(&snapshot(92, 0.5));
        assert_eq!(eval.status, GoalStatus::Violated);
        assert_eq!(eval.severity, Severity::High);
    }

    #[test]
    fn violated_when_heap_utilization_exceeds_max() {
        let eval = goal().evaluate(&snapshot(10, 0.95));
        assert_eq!(eval.status, GoalStatus::Violated);
    }

    #[test]
    fn at_risk_just_below_db_threshold() {
        // 0.85 * 0.8 = 0.68 -> 69 connections sits just above the at-risk
        // line but below the 80-connection violation line.
        let eval = goal().evaluate(&snapshot(69, 0.5));
        assert_eq!(eval.status, GoalStatus::AtRisk);
    }

    #[test]
    fn met_when_comfortably_under_both_limits() {
        let eval = goal().evaluate(&snapshot(40, 0.3));
        assert_eq!(eval.status, GoalStatus::Met);
        if let bx_common::DerivedMetrics::Resource(derived) = eval.metrics {
            assert!(!derived.connection_pressure);
            assert_eq!(derived.safe_max_connections, 80);
        } else {
            panic!("expected resource derived metrics");
        }
    }
}
