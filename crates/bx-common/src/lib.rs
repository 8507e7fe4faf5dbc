//! Shared data model for the adaptive parallel batch execution engine.
//!
//! Holds the types that cross crate boundaries: the execution context, the
//! concurrency dial types, the metrics snapshot, the goal evaluation
//! vocabulary, dial adjustments, and record batching helpers. Everything
//! here is plain, immutable-after-construction data — no behavior that
//! belongs to a single component lives in this crate.

pub mod adjustment;
pub mod batch;
pub mod concurrency;
pub mod execution_context;
pub mod goal;
pub mod logging;
pub mod metrics;

pub use adjustment::DialAdjustment;
pub use batch::{chunk_records, ProcessingResult};
pub use concurrency::{ConcurrencyLimits, ConcurrencySettings, LimitsError, HARD_ENGINE_CAP};
pub use execution_context::{ExecutionContext, ExecutionContextBuilder};
pub use goal::{
    DerivedMetrics, ErrorDerived, GoalEvaluation, GoalStatus, PerformanceDerived, ResourceDerived,
    Severity,
};
pub use metrics::MetricsSnapshot;
