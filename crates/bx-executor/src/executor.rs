//! Pipeline Executor (C8): the top-level driver. Analogous to the
//! `tokio::select!`-based shutdown orchestration in
//! `bin/fc-outbox-processor`'s `main`, generalized into a library function —
//! here the "shutdown signal" racing the run is the manager's tick interval
//! rather than Ctrl+C.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use bx_common::{ConcurrencyLimits, ExecutionContext};
use bx_engine::fixtures::InMemoryFetcher;
use bx_engine::{BatchProcessor, Engine, EngineControl, ExecutionResult, ProgressTracker, WorkItemFetcher, WorkItemReader};
use bx_gates::ConcurrencyGates;
use bx_manager::{GoalBinding, ManagerConfig, RuntimeManager};
use bx_metrics::{MetricsCollector, ResourceProbe, RunCounters};
use bx_sizer::{size_workload, InitialDialStrategy, RecordCounter, ResourceSnapshot, SizingStrategy};

use crate::hooks::{HookedTracker, NoopHooks, PipelineHooks};

/// Static, run-scoped knobs that don't belong to any one component.
#[derive(Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub limits: ConcurrencyLimits,
    pub sizing: SizingStrategy,
    pub manager: ManagerConfig,
    pub tick_period: Duration,
}

/// Ties the sizer, gates, engine, and runtime manager together into one run.
pub struct PipelineExecutor<T, R, V> {
    config: PipelineConfig,
    dial_strategy: Box<dyn InitialDialStrategy>,
    manager: RuntimeManager,
    sizing_resources: ResourceSnapshot,
    resource_probe: Arc<dyn ResourceProbe>,
    record_counter: Option<Box<dyn RecordCounter>>,
    hooks: Arc<dyn PipelineHooks<T>>,
    _marker: PhantomData<fn() -> (T, R, V)>,
}

impl<T, R, V> PipelineExecutor<T, R, V>
where
    T: Send + Sync + Clone + 'static,
    R: Send + Sync + Clone + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(
        config: PipelineConfig,
        bindings: Vec<GoalBinding>,
        dial_strategy: Box<dyn InitialDialStrategy>,
        sizing_resources: ResourceSnapshot,
        resource_probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        let manager = RuntimeManager::new(bindings, config.limits, config.manager);
        Self {
            config,
            dial_strategy,
            manager,
            sizing_resources,
            resource_probe,
            record_counter: None,
            hooks: Arc::new(NoopHooks),
            _marker: PhantomData,
        }
    }

    pub fn with_record_counter(mut self, counter: Box<dyn RecordCounter>) -> Self {
        self.record_counter = Some(counter);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn PipelineHooks<T>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub async fn run(
        &self,
        ctx: Arc<ExecutionContext>,
        fetcher: Arc<dyn WorkItemFetcher<T>>,
        reader: Arc<dyn WorkItemReader<T, R>>,
        processor: Arc<dyn BatchProcessor<R, V>>,
        tracker: Arc<dyn ProgressTracker<T, V>>,
    ) -> anyhow::Result<ExecutionResult> {
        let items = fetcher.fetch_work_items(&ctx).await?;
        let item_count = items.len() as u64;
        self.hooks.before_batch(item_count);

        let plan = size_workload(
            self.config.sizing,
            item_count,
            self.record_counter.as_deref(),
            &self.sizing_resources,
            &self.config.limits,
            self.dial_strategy.as_ref(),
        )
        .await?;

        info!(
            workload_class = ?plan.workload_class,
            work_item_concurrency = plan.initial_settings.work_item_concurrency,
            processing_concurrency = plan.initial_settings.processing_concurrency,
            "pipeline sized, starting engine"
        );

        let gates = Arc::new(ConcurrencyGates::new(plan.initial_settings));
        let counters = Arc::new(RunCounters::new());
        let engine: Engine<T, R, V> = Engine::new(gates, counters.clone(), self.config.batch_size);
        let collector = MetricsCollector::new(counters, Arc::clone(&self.resource_probe));

        // The real fetcher is invoked exactly once, above, for sizing; the
        // engine gets an in-memory replay of the same items so it never
        // calls out to the caller's fetcher a second time.
        let prefetched = Arc::new(InMemoryFetcher::new(items)) as Arc<dyn WorkItemFetcher<T>>;
        let hooked_tracker = Arc::new(HookedTracker::new(tracker, Arc::clone(&self.hooks))) as Arc<dyn ProgressTracker<T, V>>;

        let run_fut = engine.execute(ctx, prefetched, reader, processor, hooked_tracker);
        tokio::pin!(run_fut);

        let mut ticker = tokio::time::interval(self.config.tick_period);
        ticker.tick().await; // interval fires immediately; skip the zero-delay tick

        let result = loop {
            tokio::select! {
                biased;
                res = &mut run_fut => break res?,
                _ = ticker.tick() => {
                    self.manager.tick(&collector, &engine as &dyn EngineControl).await;
                }
            }
        };

        self.hooks.after_batch(&result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_engine::fixtures::{InMemoryFetcher, MapProcessor, MapReader, RecordingTracker};
    use bx_goals::{PerformanceGoal, PerformanceGoalConfig};
    use bx_metrics::NoopResourceProbe;
    use bx_strategies::PerformanceStrategy;

    fn limits() -> ConcurrencyLimits {
        ConcurrencyLimits::new(1, 4, 1, 4).unwrap()
    }

    fn config(sizing: SizingStrategy, tick_period_ms: u64) -> PipelineConfig {
        PipelineConfig {
            batch_size: 4,
            limits: limits(),
            sizing,
            manager: ManagerConfig {
                cooldown: Duration::from_secs(30),
            },
            tick_period: Duration::from_millis(tick_period_ms),
        }
    }

    #[tokio::test]
    async fn processes_all_items_with_no_goals() {
        let executor: PipelineExecutor<i32, i32, i32> = PipelineExecutor::new(
            config(SizingStrategy::Static, 50),
            Vec::new(),
            Box::new(bx_sizer::WorkloadAwareStrategy),
            ResourceSnapshot::new(100),
            Arc::new(NoopResourceProbe),
        );

        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1, 2, 3, 4, 5]));
        let reader = Arc::new(MapReader::new(|item: &i32| Ok(vec![*item])));
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r * 2)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = executor
            .run(
                ctx,
                fetcher,
                reader,
                processor,
                Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>,
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.total_work_items, 5);
        assert_eq!(result.work_items_processed, 5);
        assert_eq!(tracker.completions.lock().unwrap().len(), 5);
    }

    /// Reader that sleeps before returning, so a run takes long enough for
    /// the manager to tick (and, here, abort) before it would otherwise
    /// finish on its own.
    struct SlowReader {
        per_item_delay: Duration,
    }

    #[async_trait::async_trait]
    impl WorkItemReader<i32, i32> for SlowReader {
        async fn read_work_item(
            &self,
            item: &i32,
            _ctx: &ExecutionContext,
        ) -> Result<Vec<i32>, bx_engine::EngineError> {
            tokio::time::sleep(self.per_item_delay).await;
            Ok(vec![*item])
        }
    }

    #[tokio::test]
    async fn critical_deadline_violation_aborts_mid_run() {
        let goal = PerformanceGoal::new(PerformanceGoalConfig {
            deadline: Duration::from_millis(50),
            min_rate_per_minute: 1_000_000.0,
            tolerance: 0.8,
        });
        let bindings = vec![GoalBinding::new(Box::new(goal), Box::new(PerformanceStrategy))];

        // Small workload (3 items, limits min_work_item=1) starts at
        // work_item_concurrency=1, so the three 30ms reads run back to
        // back: ~90ms total, comfortably past the 50ms deadline.
        let executor: PipelineExecutor<i32, i32, i32> = PipelineExecutor::new(
            config(SizingStrategy::Static, 10),
            bindings,
            Box::new(bx_sizer::WorkloadAwareStrategy),
            ResourceSnapshot::new(100),
            Arc::new(NoopResourceProbe),
        );

        let ctx = Arc::new(ExecutionContext::builder().build());
        let fetcher = Arc::new(InMemoryFetcher::new(vec![1, 2, 3]));
        let reader = Arc::new(SlowReader {
            per_item_delay: Duration::from_millis(30),
        });
        let processor = Arc::new(MapProcessor::new(|r: &i32| Ok(*r)));
        let tracker: Arc<RecordingTracker<i32, i32>> = Arc::new(RecordingTracker::new());

        let result = executor
            .run(
                ctx,
                fetcher,
                reader,
                processor,
                Arc::clone(&tracker) as Arc<dyn ProgressTracker<i32, i32>>,
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.abort_reason.as_deref(), Some("performance"));
    }
}
