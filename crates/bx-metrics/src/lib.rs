//! Metrics collection for the adaptive batch execution engine (C3).

pub mod collector;
pub mod counters;
pub mod probe;

pub use collector::MetricsCollector;
pub use counters::{RunCounters, RunCountersSnapshot};
pub use probe::{FixedResourceProbe, NoopResourceProbe, ResourceProbe};
