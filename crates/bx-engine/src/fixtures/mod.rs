//! In-memory reference implementations of the engine's collaborator traits,
//! for tests — analogous to `fc-outbox`'s `InMemoryDispatchTarget`
//! (spec.md §6's "Supplemented feature" in SPEC_FULL.md §4.12).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bx_common::{ExecutionContext, ProcessingResult};

use crate::error::EngineError;
use crate::traits::{BatchProcessor, ProgressTracker, WorkItemFetcher, WorkItemReader};

/// Fetcher that returns a fixed list of work items, ignoring the context.
pub struct InMemoryFetcher<T> {
    items: Vec<T>,
}

impl<T> InMemoryFetcher<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T> WorkItemFetcher<T> for InMemoryFetcher<T>
where
    T: Send + Sync + Clone,
{
    async fn fetch_work_items(&self, _ctx: &ExecutionContext) -> Result<Vec<T>, EngineError> {
        Ok(self.items.clone())
    }
}

/// Reader keyed by work item via a lookup function, so tests can simulate
/// both successful reads and per-item failures.
pub struct MapReader<T, R, F>
where
    F: Fn(&T) -> Result<Vec<R>, EngineError> + Send + Sync,
{
    lookup: F,
    _marker: std::marker::PhantomData<fn() -> (T, R)>,
}

impl<T, R, F> MapReader<T, R, F>
where
    F: Fn(&T) -> Result<Vec<R>, EngineError> + Send + Sync,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, R, F> WorkItemReader<T, R> for MapReader<T, R, F>
where
    T: Send + Sync,
    R: Send + Sync,
    F: Fn(&T) -> Result<Vec<R>, EngineError> + Send + Sync,
{
    async fn read_work_item(&self, item: &T, _ctx: &ExecutionContext) -> Result<Vec<R>, EngineError> {
        (self.lookup)(item)
    }
}

/// Processor that maps every record through a fallible closure, turning an
/// `Err` into a per-record `Failure` result rather than propagating it —
/// mirrors the contract that `process_batch` never itself returns a `Result`.
pub struct MapProcessor<R, V, F>
where
    F: Fn(&R) -> Result<V, String> + Send + Sync,
{
    map: F,
    _marker: std::marker::PhantomData<fn() -> (R, V)>,
}

impl<R, V, F> MapProcessor<R, V, F>
where
    F: Fn(&R) -> Result<V, String> + Send + Sync,
{
    pub fn new(map: F) -> Self {
        Self {
            map,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<R, V, F> BatchProcessor<R, V> for MapProcessor<R, V, F>
where
    R: Send + Sync,
    V: Send + Sync,
    F: Fn(&R) -> Result<V, String> + Send + Sync,
{
    async fn process_batch(&self, records: &[R], _ctx: &ExecutionContext) -> Vec<ProcessingResult<V>> {
        records
            .iter()
            .map(|r| match (self.map)(r) {
                Ok(v) => ProcessingResult::Success(v),
                Err(e) => ProcessingResult::Failure(e),
            })
            .collect()
    }
}

/// Progress tracker that records every callback invocation for assertions.
#[derive(Default)]
pub struct RecordingTracker<T, V> {
    pub starts: Mutex<Vec<T>>,
    pub completions: Mutex<Vec<(T, usize)>>,
    pub failures: Mutex<Vec<(T, String)>>,
    pub progress: Mutex<Vec<(u64, u64)>>,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<T, V> RecordingTracker<T, V>
where
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            starts: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            progress: Mutex::new(Vec::new()),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, V> ProgressTracker<T, V> for RecordingTracker<T, V>
where
    T: Clone + Send + Sync,
    V: Send + Sync,
{
    fn on_work_item_start(&self, item: &T) {
        self.starts.lock().unwrap().push(item.clone());
    }

    fn on_work_item_complete(&self, item: &T, record_count: usize, _results: &[ProcessingResult<V>]) {
        self.completions.lock().unwrap().push((item.clone(), record_count));
    }

    fn on_work_item_failure(&self, item: &T, error: &EngineError) {
        self.failures.lock().unwrap().push((item.clone(), error.to_string()));
    }

    fn report_progress(&self, processed: u64, total: u64) {
        self.progress.lock().unwrap().push((processed, total));
    }
}

pub fn noop_tracker<T, V>() -> Arc<dyn ProgressTracker<T, V>>
where
    T: Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    Arc::new(RecordingTracker::new())
}
