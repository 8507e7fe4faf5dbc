//! External interface contracts (spec.md §6). Implementations live either in
//! `fixtures` (in-memory, for tests) or in `bin/bx-runner` (filesystem).

use async_trait::async_trait;
use bx_common::{ExecutionContext, ProcessingResult};

use crate::error::EngineError;

/// Called once per run to obtain the full work-item list.
#[async_trait]
pub trait WorkItemFetcher<T>: Send + Sync {
    async fn fetch_work_items(&self, ctx: &ExecutionContext) -> Result<Vec<T>, EngineError>;
}

/// Called once per work item to expand it into records.
#[async_trait]
pub trait WorkItemReader<T, R>: Send + Sync {
    async fn read_work_item(&self, item: &T, ctx: &ExecutionContext) -> Result<Vec<R>, EngineError>;
}

/// Called once per record batch. Never returns a `Result` — a batch that
/// fails entirely is represented by a `Failure` result per input record
/// (spec.md §4.2's error policy); a processor that panics is caught by the
/// engine at the task boundary and turned into the same shape.
#[async_trait]
pub trait BatchProcessor<R, V>: Send + Sync {
    async fn process_batch(&self, records: &[R], ctx: &ExecutionContext) -> Vec<ProcessingResult<V>>;
}

/// Observer callbacks. Must be non-blocking and side-effect only
/// (spec.md §5, §6).
pub trait ProgressTracker<T, V>: Send + Sync {
    fn on_work_item_start(&self, item: &T);
    fn on_work_item_complete(&self, item: &T, record_count: usize, results: &[ProcessingResult<V>]);
    fn on_work_item_failure(&self, item: &T, error: &EngineError);
    fn report_progress(&self, processed: u64, total: u64);
}
