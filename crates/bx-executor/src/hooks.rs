//! Before/after callbacks around a run and around each work item (spec.md
//! §4.8's "step and batch hooks"). Plain side-effecting callbacks, no return
//! value — the same shape as `ProgressTracker`, which is why `HookedTracker`
//! below composes the two instead of threading hooks through `bx-engine`.

use std::sync::Arc;

use bx_common::ProcessingResult;
use bx_engine::{EngineError, ExecutionResult, ProgressTracker};

/// Lifecycle callbacks for one pipeline run. "Batch" here means the whole
/// run, not a record batch; "step" means one work item.
pub trait PipelineHooks<T>: Send + Sync {
    fn before_batch(&self, _total_work_items: u64) {}
    fn after_batch(&self, _result: &ExecutionResult) {}
    fn before_step(&self, _item: &T) {}
    fn after_step(&self, _item: &T) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl<T> PipelineHooks<T> for NoopHooks {}

/// Adapts a `PipelineHooks<T>` into a `ProgressTracker<T, V>` by delegating
/// to an inner tracker and firing the step hooks alongside it.
pub struct HookedTracker<T, V> {
    inner: Arc<dyn ProgressTracker<T, V>>,
    hooks: Arc<dyn PipelineHooks<T>>,
}

impl<T, V> HookedTracker<T, V> {
    pub fn new(inner: Arc<dyn ProgressTracker<T, V>>, hooks: Arc<dyn PipelineHooks<T>>) -> Self {
        Self { inner, hooks }
    }
}

impl<T, V> ProgressTracker<T, V> for HookedTracker<T, V>
where
    T: Send + Sync,
    V: Send + Sync,
{
    fn on_work_item_start(&self, item: &T) {
        self.hooks.before_step(item);
        self.inner.on_work_item_start(item);
    }

    fn on_work_item_complete(&self, item: &T, record_count: usize, results: &[ProcessingResult<V>]) {
        self.inner.on_work_item_complete(item, record_count, results);
        self.hooks.after_step(item);
    }

    fn on_work_item_failure(&self, item: &T, error: &EngineError) {
        self.inner.on_work_item_failure(item, error);
        self.hooks.after_step(item);
    }

    fn report_progress(&self, processed: u64, total: u64) {
        self.inner.report_progress(processed, total);
    }
}
