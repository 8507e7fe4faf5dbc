//! `MetricsSnapshot`: an immutable, point-in-time reading of run progress and
//! resource usage. Rates are deltas over wall time since the previous
//! snapshot; the first snapshot uses run-start as its anchor.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Immutable metrics reading at an instant. Cheap to clone; every field is
/// `Copy` or reference-counted data, so reading the same instance twice
/// always yields identical values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub elapsed: Duration,

    pub work_items_processed: u64,
    pub total_work_items: u64,
    pub failed_work_items: u64,
    pub records_processed: u64,

    pub files_per_minute: f64,
    pub records_per_second: f64,

    pub active_db_connections: u32,
    pub heap_utilization: f64,

    pub total_errors: u64,
    pub critical_error_types: BTreeSet<String>,
}

impl MetricsSnapshot {
    pub fn percent_complete(&self) -> f64 {
        if self.total_work_items == 0 {
            return 0.0;
        }
        100.0 * (self.work_items_processed as f64) / (self.total_work_items as f64)
    }

    pub fn has_critical_error_of(&self, types: &BTreeSet<String>) -> bool {
        !self.critical_error_types.is_disjoint(types)
    }

    pub fn error_rate(&self) -> f64 {
        self.total_errors as f64 / (self.records_processed.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            run_id: Uuid::nil(),
            timestamp: Utc::now(),
            elapsed: Duration::from_secs(60),
            work_items_processed: 25,
            total_work_items: 100,
            failed_work_items: 0,
            records_processed: 1000,
            files_per_minute: 25.0,
            records_per_second: 16.6,
            active_db_connections: 10,
            heap_utilization: 0.4,
            total_errors: 5,
            critical_error_types: BTreeSet::new(),
        }
    }

    #[test]
    fn percent_complete_is_a_percentage() {
        assert_eq!(base_snapshot().percent_complete(), 25.0);
    }

    #[test]
    fn percent_complete_handles_zero_total() {
        let mut snap = base_snapshot();
        snap.total_work_items = 0;
        assert_eq!(snap.percent_complete(), 0.0);
    }

    #[test]
    fn error_rate_avoids_division_by_zero() {
        let mut snap = base_snapshot();
        snap.records_processed = 0;
        snap.total_errors = 3;
        assert_eq!(snap.error_rate(), 3.0);
    }

    #[test]
    fn reading_twice_yields_identical_fields() {
        let snap = base_snapshot();
        let a = snap.clone();
        let b = snap.clone();
        assert_eq!(a, b);
    }
}
