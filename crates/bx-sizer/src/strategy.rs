//! Inputs to a sizing run (spec.md §4.7).

use async_trait::async_trait;

use crate::error::SizerError;

/// How total record count is determined before the run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingStrategy {
    /// Skip record counting; dial purely on item count.
    Static,
    /// `totalRecords = itemCount * estimatedRecordsPerItem`.
    Estimated { estimated_records_per_item: u64 },
    /// Ask a `RecordCounter` once.
    Dynamic,
}

/// A callback that returns the total record count across all work items.
/// Invoked at most once per run, under DYNAMIC sizing.
#[async_trait]
pub trait RecordCounter: Send + Sync {
    async fn count_records(&self) -> Result<u64, SizerError>;
}

/// `RecordCounter` backed by a fixed value, for tests and for callers who
/// already know the total.
pub struct FixedRecordCounter(pub u64);

#[async_trait]
impl RecordCounter for FixedRecordCounter {
    async fn count_records(&self) -> Result<u64, SizerError> {
        Ok(self.0)
    }
}
