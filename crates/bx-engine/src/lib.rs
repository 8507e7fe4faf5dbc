//! Engine (C2): drives one run of work items/record batches to completion,
//! gated by `bx-gates` and counted by `bx-metrics`.

pub mod control;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod traits;

pub use bx_common::ProcessingResult;
pub use control::EngineControl;
pub use engine::{Engine, ExecutionResult};
pub use error::EngineError;
pub use traits::{BatchProcessor, ProgressTracker, WorkItemFetcher, WorkItemReader};
