//! Record batches and per-record processing results.

/// One record's outcome from a `BatchProcessor`. Result order mirrors input
/// order of its batch (spec.md §3).
#[derive(Debug, Clone)]
pub enum ProcessingResult<V> {
    Success(V),
    Failure(String),
}

impl<V> ProcessingResult<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn success(value: V) -> Self {
        ProcessingResult::Success(value)
    }

    pub fn failure(cause: impl Into<String>) -> Self {
        ProcessingResult::Failure(cause.into())
    }
}

/// Split `records` into batches of at most `batch_size`. The last batch of a
/// work item may be short; empty batches are never emitted (spec.md §3).
///
/// # Panics
///
/// Panics if `batch_size` is zero — callers validate configuration before a
/// run starts (see `bx-config`), so this is a programmer error, not a
/// runtime condition.
pub fn chunk_records<R: Clone>(records: &[R], batch_size: usize) -> Vec<Vec<R>> {
    assert!(batch_size > 0, "batch_size must be > 0");
    if records.is_empty() {
        return Vec::new();
    }
    records
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_records_never_emits_empty_batches() {
        let chunks = chunk_records(&Vec::<i32>::new(), 10);
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_records_respects_batch_size_with_short_tail() {
        let records: Vec<i32> = (0..25).collect();
        let chunks = chunk_records(&records, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn chunk_records_preserves_order() {
        let records: Vec<i32> = (0..7).collect();
        let chunks = chunk_records(&records, 3);
        let flattened: Vec<i32> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, records);
    }

    #[test]
    #[should_panic]
    fn chunk_records_rejects_zero_batch_size() {
        let _ = chunk_records(&[1, 2, 3], 0);
    }
}
