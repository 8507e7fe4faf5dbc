//! `MetricsCollector`: produces `MetricsSnapshot`s on demand, computing
//! rolling rates as deltas over wall time since the previous snapshot. The
//! first snapshot uses run-start as its anchor (spec.md §4.3).

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use bx_common::MetricsSnapshot;

use crate::counters::{RunCounters, RunCountersSnapshot};
use crate::probe::ResourceProbe;

struct Anchor {
    at: Instant,
    counters: RunCountersSnapshot,
}

/// Collects `MetricsSnapshot`s for one run. `snapshot()` takes a brief
/// uncontended lock to read-and-replace the rate anchor; it never blocks on
/// I/O, matching the "snapshot() is free of contention" contract in
/// spec.md §6.
pub struct MetricsCollector {
    run_id: Uuid,
    start: Instant,
    probe: Arc<dyn ResourceProbe>,
    counters: Arc<RunCounters>,
    critical_error_types: Mutex<BTreeSet<String>>,
    anchor: Mutex<Anchor>,
}

impl MetricsCollector {
    pub fn new(counters: Arc<RunCounters>, probe: Arc<dyn ResourceProbe>) -> Self {
        let start = Instant::now();
        let zero = RunCountersSnapshot {
            work_items_processed: 0,
            failed_work_items: 0,
            total_work_items: 0,
            records_processed: 0,
            total_errors: 0,
        };
        Self {
            run_id: Uuid::new_v4(),
            start,
            probe,
            counters,
            critical_error_types: Mutex::new(BTreeSet::new()),
            anchor: Mutex::new(Anchor {
                at: start,
                counters: zero,
            }),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Register a critical error type token observed during the run. Tokens
    /// accumulate for the lifetime of the collector (append-only).
    pub fn record_critical_error(&self, error_type: impl Into<String>) {
        let mut types = self.critical_error_types.lock().unwrap();
        types.insert(error_type.into());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = Instant::now();
        let current = self.counters.read();

        let mut anchor = self.anchor.lock().unwrap();
        let elapsed_since_anchor = now.saturating_duration_since(anchor.at);
        let elapsed_secs = elapsed_since_anchor.as_secs_f64().max(f64::EPSILON);

        let delta_work_items =
            current.work_items_processed.saturating_sub(anchor.counters.work_items_processed);
        let delta_records =
            current.records_processed.saturating_sub(anchor.counters.records_processed);

        let files_per_minute = (delta_work_items as f64) / elapsed_secs * 60.0;
        let records_per_second = (delta_records as f64) / elapsed_secs;

        anchor.at = now;
        anchor.counters = current;
        drop(anchor);

        let critical_error_types = self.critical_error_types.lock().unwrap().clone();

        MetricsSnapshot {
            run_id: self.run_id,
            timestamp: Utc::now(),
            elapsed: now.saturating_duration_since(self.start),
            work_items_processed: current.work_items_processed,
            total_work_items: current.total_work_items,
            failed_work_items: current.failed_work_items,
            records_processed: current.records_processed,
            files_per_minute,
            records_per_second,
            active_db_connections: self.probe.active_db_connections(),
            heap_utilization: self.probe.heap_utilization(),
            total_errors: current.total_errors,
            critical_error_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedResourceProbe;
    use std::thread::sleep;
    use std::time::Duration;

    fn probe() -> Arc<dyn ResourceProbe> {
        Arc::new(FixedResourceProbe {
            active_db_connections: 10,
            heap_utilization: 0.3,
        })
    }

    #[test]
    fn first_snapshot_anchors_on_run_start() {
        let counters = Arc::new(RunCounters::new());
        counters.set_total_work_items(10);
        let collector = MetricsCollector::new(Arc::clone(&counters), probe());

        sleep(Duration::from_millis(5));
        counters.incr_work_items_processed(1);
        let snap = collector.snapshot();
        assert!(snap.files_per_minute > 0.0);
        assert_eq!(snap.total_work_items, 10);
    }

    #[test]
    fn rates_are_deltas_since_previous_snapshot() {
        let counters = Arc::new(RunCounters::new());
        let collector = MetricsCollector::new(Arc::clone(&counters), probe());

        counters.incr_records_processed(100);
        let _ = collector.snapshot();

        sleep(Duration::from_millis(5));
        counters.incr_records_processed(50);
        let second = collector.snapshot();
        // only the delta (50) since the previous snapshot should count
        assert!(second.records_per_second > 0.0);
    }

    #[test]
    fn critical_errors_accumulate_and_are_observable() {
        let counters = Arc::new(RunCounters::new());
        let collector = MetricsCollector::new(counters, probe());
        collector.record_critical_error("OutOfMemoryError");
        collector.record_critical_error("DatabaseConnectionExhausted");
        let snap = collector.snapshot();
        assert_eq!(snap.critical_error_types.len(), 2);
        assert!(snap.critical_error_types.contains("OutOfMemoryError"));
    }

    #[test]
    fn snapshot_reflects_resource_probe() {
        let counters = Arc::new(RunCounters::new());
        let collector = MetricsCollector::new(counters, probe());
        let snap = collector.snapshot();
        assert_eq!(snap.active_db_connections, 10);
        assert_eq!(snap.heap_utilization, 0.3);
    }
}
