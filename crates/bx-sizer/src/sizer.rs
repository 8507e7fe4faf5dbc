//! One-shot pre-flight sizing (spec.md §4.7). Structured as a single
//! stateless call rather than a long-lived object — there is nothing to
//! hold between runs.

use bx_common::{ConcurrencyLimits, ConcurrencySettings};
use tracing::info;

use crate::dials::{InitialDialStrategy, WorkloadClass};
use crate::error::SizerError;
use crate::resources::ResourceSnapshot;
use crate::strategy::{RecordCounter, SizingStrategy};

/// Outcome of sizing one run, handed to the executor before the engine starts.
#[derive(Debug, Clone, Copy)]
pub struct SizingPlan {
    pub initial_settings: ConcurrencySettings,
    pub workload_class: WorkloadClass,
    pub total_records: Option<u64>,
}

/// Computes total record count (if requested) and initial concurrency dials
/// for a run. Called once, before the engine starts.
pub async fn size_workload(
    sizing: SizingStrategy,
    item_count: u64,
    record_counter: Option<&dyn RecordCounter>,
    resources: &ResourceSnapshot,
    limits: &ConcurrencyLimits,
    dial_strategy: &dyn InitialDialStrategy,
) -> Result<SizingPlan, SizerError> {
    let total_records = match sizing {
        SizingStrategy::Static => None,
        SizingStrategy::Estimated {
            estimated_records_per_item,
        } => Some(item_count * estimated_records_per_item),
        SizingStrategy::Dynamic => {
            let counter = record_counter.ok_or(SizerError::MissingRecordCounter)?;
            Some(counter.count_records().await?)
        }
    };

    // STATIC sizing has no record-count signal to size dials from, so it
    // always starts at the floor rather than deferring to whichever
    // `InitialDialStrategy` the caller wired in.
    let initial_settings = match sizing {
        SizingStrategy::Static => ConcurrencySettings::new(limits.min_work_item, limits.min_processing),
        _ => dial_strategy.initial_dials(item_count, limits, resources),
    };
    let workload_class = WorkloadClass::classify(item_count);

    info!(
        item_count,
        work_item_concurrency = initial_settings.work_item_concurrency,
        processing_concurrency = initial_settings.processing_concurrency,
        ?workload_class,
        total_records,
        "sized initial concurrency dials"
    );

    Ok(SizingPlan {
        initial_settings,
        workload_class,
        total_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dials::WorkloadAwareStrategy;
    use crate::strategy::FixedRecordCounter;

    fn limits() -> ConcurrencyLimits {
        ConcurrencyLimits::new(5, 20, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn static_sizing_skips_record_counting() {
        let plan = size_workload(
            SizingStrategy::Static,
            10,
            None,
            &ResourceSnapshot::new(100),
            &limits(),
            &WorkloadAwareStrategy,
        )
        .await
        .unwrap();

        assert_eq!(plan.total_records, None);
        assert_eq!(plan.workload_class, WorkloadClass::Small);
    }

    #[tokio::test]
    async fn static_sizing_forces_minimum_dials_regardless_of_workload_class() {
        // 50 items classifies as Medium, which `WorkloadAwareStrategy` would
        // otherwise size to a midpoint well above the floor.
        let plan = size_workload(
            SizingStrategy::Static,
            50,
            None,
            &ResourceSnapshot::new(100),
            &limits(),
            &WorkloadAwareStrategy,
        )
        .await
        .unwrap();

        assert_eq!(plan.workload_class, WorkloadClass::Medium);
        assert_eq!(plan.initial_settings.work_item_concurrency, 5);
        assert_eq!(plan.initial_settings.processing_concurrency, 3);
    }

    #[tokio::test]
    async fn estimated_sizing_multiplies_item_count() {
        let plan = size_workload(
            SizingStrategy::Estimated {
                estimated_records_per_item: 250,
            },
            10,
            None,
            &ResourceSnapshot::new(100),
            &limits(),
            &WorkloadAwareStrategy,
        )
        .await
        .unwrap();

        assert_eq!(plan.total_records, Some(2500));
    }

    #[tokio::test]
    async fn dynamic_sizing_invokes_counter_once() {
        let counter = FixedRecordCounter(4_200);
        let plan = size_workload(
            SizingStrategy::Dynamic,
            10,
            Some(&counter),
            &ResourceSnapshot::new(100),
            &limits(),
            &WorkloadAwareStrategy,
        )
        .await
        .unwrap();

        assert_eq!(plan.total_records, Some(4_200));
    }

    #[tokio::test]
    async fn dynamic_sizing_without_counter_is_an_error() {
        let result = size_workload(
            SizingStrategy::Dynamic,
            10,
            None,
            &ResourceSnapshot::new(100),
            &limits(),
            &WorkloadAwareStrategy,
        )
        .await;

        assert_eq!(result.unwrap_err(), SizerError::MissingRecordCounter);
    }
}
