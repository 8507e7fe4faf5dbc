//! Two independent counting semaphores (`work_item`, `processing`) with live
//! resize.
//!
//! Grounded on `fc-router::pool::ProcessPool::update_concurrency`: growing a
//! gate releases permits immediately (`Semaphore::add_permits`); shrinking a
//! gate acquires the excess permits (with a bounded timeout) and forgets
//! them, so in-flight holders are never forcibly evicted — a "soft shrink"
//! (spec.md §4.1, §9).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use bx_common::ConcurrencySettings;

/// Bound on how long a shrink may block waiting for in-flight holders to
/// release permits, per spec.md §9's note that the drain/shrink bound is
/// implementation-defined.
const SHRINK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("run was cancelled")]
    Cancelled,
}

/// RAII guard for a work-item slot. Releases the slot on drop regardless of
/// how the holder exits (success, error, or panic unwind) — this is the
/// "scoped acquisition" invariant from spec.md §4.1.
pub struct WorkItemPermit(#[allow(dead_code)] OwnedSemaphorePermit);

/// RAII guard for a processing slot.
pub struct ProcessingPermit(#[allow(dead_code)] OwnedSemaphorePermit);

/// Outcome of a `resize` call, useful for logging/testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Applied,
    /// The shrink could not acquire enough excess permits within
    /// `SHRINK_TIMEOUT`; capacity was left unchanged on that axis.
    ShrinkTimedOut,
    NoCancellation,
}

/// Two independent counting semaphores with dynamic capacity and
/// first-come-first-served fairness (the fairness tokio's `Semaphore`
/// already guarantees).
pub struct ConcurrencyGates {
    work_item: Arc<Semaphore>,
    processing: Arc<Semaphore>,
    work_item_capacity: AtomicU32,
    processing_capacity: AtomicU32,
    cancelled: AtomicBool,
}

impl ConcurrencyGates {
    pub fn new(initial: ConcurrencySettings) -> Self {
        Self {
            work_item: Arc::new(Semaphore::new(initial.work_item_concurrency as usize)),
            processing: Arc::new(Semaphore::new(initial.processing_concurrency as usize)),
            work_item_capacity: AtomicU32::new(initial.work_item_concurrency),
            processing_capacity: AtomicU32::new(initial.processing_concurrency),
            cancelled: AtomicBool::new(false),
        }
    }

    pub async fn acquire_work_item(&self) -> Result<WorkItemPermit, GateError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(GateError::Cancelled);
        }
        match Arc::clone(&self.work_item).acquire_owned().await {
            Ok(permit) => {
                if self.cancelled.load(Ordering::SeqCst) {
                    drop(permit);
                    return Err(GateError::Cancelled);
                }
                Ok(WorkItemPermit(permit))
            }
            Err(AcquireError { .. }) => Err(GateError::Cancelled),
        }
    }

    pub async fn acquire_processing(&self) -> Result<ProcessingPermit, GateError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(GateError::Cancelled);
        }
        match Arc::clone(&self.processing).acquire_owned().await {
            Ok(permit) => {
                if self.cancelled.load(Ordering::SeqCst) {
                    drop(permit);
                    return Err(GateError::Cancelled);
                }
                Ok(ProcessingPermit(permit))
            }
            Err(AcquireError { .. }) => Err(GateError::Cancelled),
        }
    }

    /// Snapshot of capacities (not in-flight counts).
    pub fn current_settings(&self) -> ConcurrencySettings {
        ConcurrencySettings::new(
            self.work_item_capacity.load(Ordering::SeqCst),
            self.processing_capacity.load(Ordering::SeqCst),
        )
    }

    /// Set new capacities; takes effect immediately. Growing releases
    /// waiting acquirers up to the new capacity; shrinking only prevents new
    /// acquisitions until in-flight returns bring the count down (soft
    /// shrink), bounded by `SHRINK_TIMEOUT`.
    pub async fn resize(&self, new: ConcurrencySettings) -> (ResizeOutcome, ResizeOutcome) {
        let wi_outcome = self
            .resize_one(
                &self.work_item,
                &self.work_item_capacity,
                new.work_item_concurrency,
                "work_item",
            )
            .await;
        let proc_outcome = self
            .resize_one(
                &self.processing,
                &self.processing_capacity,
                new.processing_concurrency,
                "processing",
            )
            .await;
        (wi_outcome, proc_outcome)
    }

    async fn resize_one(
        &self,
        semaphore: &Arc<Semaphore>,
        capacity: &AtomicU32,
        new_capacity: u32,
        label: &str,
    ) -> ResizeOutcome {
        let old_capacity = capacity.load(Ordering::SeqCst);
        if new_capacity == old_capacity {
            return ResizeOutcome::Applied;
        }

        let diff = (new_capacity as i64) - (old_capacity as i64);
        if diff > 0 {
            semaphore.add_permits(diff as usize);
            capacity.store(new_capacity, Ordering::SeqCst);
            info!(gate = label, old = old_capacity, new = new_capacity, "grew gate capacity");
            ResizeOutcome::Applied
        } else {
            let to_acquire = (-diff) as u32;
            let semaphore = Arc::clone(semaphore);
            let acquire = async move { semaphore.acquire_many_owned(to_acquire).await };
            match tokio::time::timeout(SHRINK_TIMEOUT, acquire).await {
                Ok(Ok(permits)) => {
                    // Hold these permits forever: this is how a tokio
                    // semaphore's capacity is permanently reduced, since it
                    // has no `remove_permits` API.
                    std::mem::forget(permits);
                    capacity.store(new_capacity, Ordering::SeqCst);
                    info!(gate = label, old = old_capacity, new = new_capacity, "shrank gate capacity");
                    ResizeOutcome::Applied
                }
                Ok(Err(_)) => ResizeOutcome::NoCancellation,
                Err(_) => {
                    warn!(
                        gate = label,
                        old = old_capacity,
                        requested = new_capacity,
                        "shrink timed out waiting for in-flight holders; capacity unchanged"
                    );
                    ResizeOutcome::ShrinkTimedOut
                }
            }
        }
    }

    /// Cooperative cancellation: no new gate acquisitions succeed after
    /// this call. Terminal for the life of this `ConcurrencyGates` instance.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.work_item.close();
        self.processing.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
