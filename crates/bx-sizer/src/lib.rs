//! Workload Sizer (C7): one-shot pre-flight calculation of initial
//! concurrency dials, structured like `fc-stream`'s one-shot index
//! initializer — a plain async function over a small config struct, no
//! state retained afterward.

pub mod dials;
pub mod error;
pub mod resources;
pub mod sizer;
pub mod strategy;

pub use dials::{AggressiveStrategy, ConservativeStrategy, InitialDialStrategy, WorkloadAwareStrategy, WorkloadClass};
pub use error::SizerError;
pub use resources::ResourceSnapshot;
pub use sizer::{size_workload, SizingPlan};
pub use strategy::{FixedRecordCounter, RecordCounter, SizingStrategy};
