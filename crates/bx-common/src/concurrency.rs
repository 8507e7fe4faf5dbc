//! Concurrency dial settings and run-scoped limits.

use thiserror::Error;

/// Current gate capacities (a snapshot, not in-flight counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencySettings {
    pub work_item_concurrency: u32,
    pub processing_concurrency: u32,
}

impl ConcurrencySettings {
    pub fn new(work_item_concurrency: u32, processing_concurrency: u32) -> Self {
        Self {
            work_item_concurrency,
            processing_concurrency,
        }
    }
}

/// The implementation-defined hard engine cap mentioned in spec.md's data
/// model (`max <= hard engine cap`).
pub const HARD_ENGINE_CAP: u32 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitsError {
    #[error("minWI must be >= 1, got {0}")]
    MinWorkItemTooLow(u32),
    #[error("minProc must be >= 1, got {0}")]
    MinProcessingTooLow(u32),
    #[error("maxWI ({max}) must be >= minWI ({min})")]
    WorkItemRangeInverted { min: u32, max: u32 },
    #[error("maxProc ({max}) must be >= minProc ({min})")]
    ProcessingRangeInverted { min: u32, max: u32 },
    #[error("maxWI ({0}) exceeds hard engine cap ({HARD_ENGINE_CAP})")]
    WorkItemExceedsHardCap(u32),
    #[error("maxProc ({0}) exceeds hard engine cap ({HARD_ENGINE_CAP})")]
    ProcessingExceedsHardCap(u32),
}

/// Run-scoped concurrency limits. Frozen at run start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    pub min_work_item: u32,
    pub max_work_item: u32,
    pub min_processing: u32,
    pub max_processing: u32,
}

impl ConcurrencyLimits {
    pub fn new(
        min_work_item: u32,
        max_work_item: u32,
        min_processing: u32,
        max_processing: u32,
    ) -> Result<Self, LimitsError> {
        let limits = Self {
            min_work_item,
            max_work_item,
            min_processing,
            max_processing,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.min_work_item < 1 {
            return Err(LimitsError::MinWorkItemTooLow(self.min_work_item));
        }
        if self.min_processing < 1 {
            return Err(LimitsError::MinProcessingTooLow(self.min_processing));
        }
        if self.max_work_item < self.min_work_item {
            return Err(LimitsError::WorkItemRangeInverted {
                min: self.min_work_item,
                max: self.max_work_item,
            });
        }
        if self.max_processing < self.min_processing {
            return Err(LimitsError::ProcessingRangeInverted {
                min: self.min_processing,
                max: self.max_processing,
            });
        }
        if self.max_work_item > HARD_ENGINE_CAP {
            return Err(LimitsError::WorkItemExceedsHardCap(self.max_work_item));
        }
        if self.max_processing > HARD_ENGINE_CAP {
            return Err(LimitsError::ProcessingExceedsHardCap(self.max_processing));
        }
        Ok(())
    }

    /// Clamp a proposed work-item capacity into `[min_work_item, max_work_item]`.
    pub fn clamp_work_item(&self, value: i64) -> u32 {
        value.clamp(self.min_work_item as i64, self.max_work_item as i64) as u32
    }

    /// Clamp a proposed processing capacity into `[min_processing, max_processing]`.
    pub fn clamp_processing(&self, value: i64) -> u32 {
        value.clamp(self.min_processing as i64, self.max_processing as i64) as u32
    }

    pub fn contains(&self, settings: ConcurrencySettings) -> bool {
        settings.work_item_concurrency >= self.min_work_item
            && settings.work_item_concurrency <= self.max_work_item
            && settings.processing_concurrency >= self.min_processing
            && settings.processing_concurrency <= self.max_processing
    }
}
