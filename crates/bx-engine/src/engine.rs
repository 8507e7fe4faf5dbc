//! `Engine`: drives one run to completion (spec.md §4.2). Grounded on
//! `fc-outbox::enhanced_processor::EnhancedOutboxProcessor` — atomics for
//! shared counters, one cooperative `running`/abort flag, `tokio::spawn` per
//! unit of work.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use bx_common::{chunk_records, ExecutionContext, ProcessingResult};
use bx_gates::ConcurrencyGates;
use bx_metrics::RunCounters;

use crate::error::EngineError;
use crate::traits::{BatchProcessor, ProgressTracker, WorkItemFetcher, WorkItemReader};

/// Result of a completed (or aborted) run, per spec.md §6's CLI surface.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub abort_reason: Option<String>,
    pub work_items_processed: u64,
    pub total_work_items: u64,
    pub records_processed: u64,
    pub total_errors: u64,
    pub duration: Duration,
}

/// Generic over the work item type `T`, the record type `R`, and the
/// per-record processing outcome `V`.
pub struct Engine<T, R, V> {
    gates: Arc<ConcurrencyGates>,
    counters: Arc<RunCounters>,
    batch_size: usize,
    abort_reason: Arc<Mutex<Option<String>>>,
    _marker: PhantomData<fn() -> (T, R, V)>,
}

impl<T, R, V> Engine<T, R, V>
where
    T: Send + Sync + Clone + 'static,
    R: Send + Sync + Clone + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(gates: Arc<ConcurrencyGates>, counters: Arc<RunCounters>, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be > 0");
        Self {
            gates,
            counters,
            batch_size,
            abort_reason: Arc::new(Mutex::new(None)),
            _marker: PhantomData,
        }
    }

    /// Live counters, read without blocking (spec.md §4.2).
    pub fn metrics(&self) -> bx_metrics::RunCountersSnapshot {
        self.counters.read()
    }

    /// Callable during `execute`; delegates to the gates, clamped elsewhere
    /// by the caller (the manager enforces `ConcurrencyLimits`).
    pub async fn adjust_concurrency(&self, settings: bx_common::ConcurrencySettings) {
        let (wi, proc) = self.gates.resize(settings).await;
        debug!(?wi, ?proc, "concurrency adjusted");
    }

    pub fn is_aborted(&self) -> bool {
        self.gates.is_cancelled()
    }

    pub fn current_settings(&self) -> bx_common::ConcurrencySettings {
        self.gates.current_settings()
    }

    /// Cooperative shutdown: no new gate acquisitions succeed; in-flight
    /// reader/processor calls are allowed to complete (spec.md §5).
    pub fn abort(&self, reason: impl Into<String>) {
        Self::record_abort(&self.abort_reason, &self.gates, reason.into());
    }

    /// Shared by `abort()` and `run_work_item`'s invariant-violation path:
    /// the first reason wins, and the gates are only ever cancelled once a
    /// reason has been recorded so `execute()` never reports `success=true`
    /// for an aborted run.
    fn record_abort(abort_reason: &Mutex<Option<String>>, gates: &ConcurrencyGates, reason: String) {
        let mut guard = abort_reason.lock().unwrap();
        if guard.is_none() {
            warn!(reason = %reason, "engine abort requested");
            *guard = Some(reason);
        }
        gates.cancel();
    }

    pub async fn execute(
        &self,
        ctx: Arc<ExecutionContext>,
        fetcher: Arc<dyn WorkItemFetcher<T>>,
        reader: Arc<dyn WorkItemReader<T, R>>,
        processor: Arc<dyn BatchProcessor<R, V>>,
        tracker: Arc<dyn ProgressTracker<T, V>>,
    ) -> Result<ExecutionResult, EngineError> {
        let start = Instant::now();
        let items = fetcher.fetch_work_items(&ctx).await?;
        self.counters.set_total_work_items(items.len() as u64);
        info!(total_work_items = items.len(), "run started");

        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            let gates = Arc::clone(&self.gates);
            let counters = Arc::clone(&self.counters);
            let abort_reason = Arc::clone(&self.abort_reason);
            let reader = Arc::clone(&reader);
            let processor = Arc::clone(&processor);
            let tracker = Arc::clone(&tracker);
            let ctx = Arc::clone(&ctx);
            let batch_size = self.batch_size;

            handles.push(tokio::spawn(Self::run_work_item(
                gates, counters, abort_reason, reader, processor, tracker, ctx, item, batch_size,
            )));
        }

        for handle in handles {
            if let Err(join_err) = handle.await {
                error!(error = %join_err, "work item task panicked");
            }
        }

        let abort_reason = self.abort_reason.lock().unwrap().clone();
        let snapshot = self.counters.read();
        if abort_reason.is_some() {
            warn!(reason = ?abort_reason, "run aborted");
        } else {
            info!("run completed");
        }

        Ok(ExecutionResult {
            success: abort_reason.is_none(),
            abort_reason,
            work_items_processed: snapshot.work_items_processed,
            total_work_items: snapshot.total_work_items,
            records_processed: snapshot.records_processed,
            total_errors: snapshot.total_errors,
            duration: start.elapsed(),
        })
    }

    async fn run_work_item(
        gates: Arc<ConcurrencyGates>,
        counters: Arc<RunCounters>,
        abort_reason: Arc<Mutex<Option<String>>>,
        reader: Arc<dyn WorkItemReader<T, R>>,
        processor: Arc<dyn BatchProcessor<R, V>>,
        tracker: Arc<dyn ProgressTracker<T, V>>,
        ctx: Arc<ExecutionContext>,
        item: T,
        batch_size: usize,
    ) {
        let permit = match gates.acquire_work_item().await {
            Ok(p) => p,
            Err(_) => return,
        };

        tracker.on_work_item_start(&item);

        let records = match reader.read_work_item(&item, &ctx).await {
            Ok(records) => records,
            Err(EngineError::InvariantViolation(msg)) => {
                error!(error = %msg, "engine invariant violated, aborting run");
                Self::record_abort(&abort_reason, &gates, "engine invariant".to_string());
                counters.incr_failed_work_items(1);
                counters.incr_total_errors(1);
                tracker.on_work_item_failure(&item, &EngineError::InvariantViolation(msg));
                counters.incr_work_items_processed(1);
                let snap = counters.read();
                tracker.report_progress(snap.work_items_processed, snap.total_work_items);
                drop(permit);
                return;
            }
            Err(err) => {
                counters.incr_failed_work_items(1);
                counters.incr_total_errors(1);
                tracker.on_work_item_failure(&item, &err);
                counters.incr_work_items_processed(1);
                let snap = counters.read();
                tracker.report_progress(snap.work_items_processed, snap.total_work_items);
                drop(permit);
                return;
            }
        };

        let batches = chunk_records(&records, batch_size);
        let mut sub_handles = Vec::with_capacity(batches.len());
        for batch in batches {
            let gates = Arc::clone(&gates);
            let processor = Arc::clone(&processor);
            let ctx = Arc::clone(&ctx);
            let len = batch.len();
            let handle = tokio::spawn(async move {
                let proc_permit = match gates.acquire_processing().await {
                    Ok(p) => p,
                    Err(_) => return Vec::new(),
                };
                let results = processor.process_batch(&batch, &ctx).await;
                drop(proc_permit);
                if results.len() != len {
                    error!(
                        expected = len,
                        actual = results.len(),
                        "processor returned a result count mismatched with its input batch"
                    );
                }
                results
            });
            sub_handles.push((len, handle));
        }

        let mut all_results: Vec<ProcessingResult<V>> = Vec::with_capacity(records.len());
        for (len, handle) in sub_handles {
            match handle.await {
                Ok(results) => {
                    for result in &results {
                        counters.incr_records_processed(1);
                        if result.is_failure() {
                            counters.incr_total_errors(1);
                        }
                    }
                    all_results.extend(results);
                }
                Err(join_err) => {
                    // `process_batch` panicked: attribute a failure to every
                    // record in that batch rather than losing the batch
                    // silently (spec.md §4.2's processor-throws policy).
                    error!(error = %join_err, "batch processing task panicked");
                    for _ in 0..len {
                        counters.incr_records_processed(1);
                        counters.incr_total_errors(1);
                        all_results.push(ProcessingResult::Failure(join_err.to_string()));
                    }
                }
            }
        }

        tracker.on_work_item_complete(&item, records.len(), &all_results);
        counters.incr_work_items_processed(1);
        let snap = counters.read();
        tracker.report_progress(snap.work_items_processed, snap.total_work_items);
        drop(permit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{InMemoryFetcher, MapProcessor, MapReader, RecordingTracker};
    use bx_common::ConcurrencySettings;
    use bx_metrics::RunCounters;

    fn gates(wi: u32, proc: u32) -> Arc<ConcurrencyGates> {
        Arc::new(ConcurrencyGates::new(ConcurrencySettings::new(wi, proc)))
    }

    #[tokio::test]
    async fn processes_every_item_and_record_on_the_happy_path() {
        let engine: Engine<i32, i32, i32> = Engine::new(gates(4, 4), Arc::new(RunCounters::new()), 2);
        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1, 2, 3]));
        let reader = Arc::new(MapReader::new(|item: &i32| Ok(vec![*item, *item * 10])));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r * 2)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, fetcher, reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.total_work_items, 3);
        assert_eq!(result.work_items_processed, 3);
        assert_eq!(result.records_processed, 6);
        assert_eq!(result.total_errors, 0);
        assert_eq!(tracker.completions.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn reader_failure_marks_item_failed_but_run_continues() {
        let engine: Engine<i32, i32, i32> = Engine::new(gates(4, 4), Arc::new(RunCounters::new()), 2);
        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1, 2]));
        let reader = Arc::new(MapReader::new(|item: &i32| {
            if *item == 1 {
                Err(EngineError::TransientItem("boom".into()))
            } else {
                Ok(vec![*item])
            }
        }));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, fetcher, reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.work_items_processed, 2);
        assert_eq!(result.total_errors, 1);
        assert_eq!(tracker.failures.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn per_record_failure_increments_errors_without_failing_item() {
        let engine: Engine<i32, i32, i32> = Engine::new(gates(4, 4), Arc::new(RunCounters::new()), 10);
        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1]));
        let reader = Arc::new(MapReader::new(|_item: &i32| Ok(vec![1, 2, 3])));
        let processor = Arc::new(MapProcessor::new(|r: &i32| {
            if *r == 2 {
                Err("bad record".to_string())
            } else {
                Ok(*r)
            }
        }));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, fetcher, reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.work_items_processed, 1);
        assert_eq!(result.records_processed, 3);
        assert_eq!(result.total_errors, 1);
    }

    #[tokio::test]
    async fn invariant_violation_aborts_the_run() {
        let engine: Engine<i32, i32, i32> = Engine::new(gates(4, 4), Arc::new(RunCounters::new()), 2);
        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1]));
        let reader = Arc::new(MapReader::new(|_item: &i32| {
            Err(EngineError::InvariantViolation("null reader output".into()))
        }));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, fetcher, reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await
            .unwrap();

        assert!(!result.success);
        assert!(engine.is_aborted());
    }

    #[tokio::test]
    async fn fetcher_failure_propagates_as_run_failure() {
        struct FailingFetcher;
        #[async_trait::async_trait]
        impl WorkItemFetcher<i32> for FailingFetcher {
            async fn fetch_work_items(&self, _ctx: &ExecutionContext) -> Result<Vec<i32>, EngineError> {
                Err(EngineError::TransientItem("cannot list items".into()))
            }
        }

        let engine: Engine<i32, i32, i32> = Engine::new(gates(4, 4), Arc::new(RunCounters::new()), 2);
        let ctx = Arc::new(ExecutionContext::builder().build());
        let reader = Arc::new(MapReader::new(|_item: &i32| Ok(vec![1])));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, Arc::new(FailingFetcher), reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn abort_prevents_new_work_item_acquisitions() {
        let gates = gates(1, 1);
        let engine: Engine<i32, i32, i32> = Engine::new(Arc::clone(&gates), Arc::new(RunCounters::new()), 2);
        engine.abort("manual test abort");
        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1, 2, 3]));
        let reader = Arc::new(MapReader::new(|item: &i32| Ok(vec![*item])));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = engine
            .execute(ctx, fetcher, reader, processor, Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.work_items_processed, 0);
    }
}
