//! Goal evaluation vocabulary shared between `bx-goals` (which produces
//! `GoalEvaluation`s) and `bx-strategies` (which consumes them).
//!
//! Per spec.md §9's re-architecture note, this replaces a dynamic
//! "metrics map keyed by string" with a tagged `DerivedMetrics` enum:
//! strategies pattern-match on the variant instead of doing string lookups.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GoalStatus {
    NotStarted,
    Met,
    AtRisk,
    Violated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Derived metrics for `PerformanceGoal` (spec.md §4.4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceDerived {
    pub required_rate: f64,
    pub current_rate: f64,
    pub rate_gap: f64,
    pub percent_complete: f64,
    pub time_remaining_minutes: f64,
}

/// Derived metrics for `ResourceGoal` (spec.md §4.4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceDerived {
    pub db_utilization_percent: f64,
    pub active_connections: u32,
    pub available_connections: u32,
    pub safe_max_connections: u32,
    pub heap_utilization_percent: f64,
    pub connection_pressure: bool,
}

/// Derived metrics for `ErrorGoal` (spec.md §4.4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDerived {
    pub total_errors: u64,
    pub error_rate: f64,
    pub error_budget_remaining: i64,
    pub failed_files: u64,
    pub has_critical_error: bool,
}

/// Tagged variant of derived metrics, one per goal kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedMetrics {
    Performance(PerformanceDerived),
    Resource(ResourceDerived),
    Error(ErrorDerived),
}

/// Result of evaluating one goal against one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalEvaluation {
    pub goal_name: &'static str,
    pub status: GoalStatus,
    pub severity: Severity,
    pub metrics: DerivedMetrics,
}

impl GoalEvaluation {
    pub fn is_violated(&self) -> bool {
        self.status == GoalStatus::Violated
    }

    pub fn is_critical_violation(&self) -> bool {
        self.is_violated() && self.severity == Severity::Critical
    }
}
