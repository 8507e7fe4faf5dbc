//! Pipeline Executor (C8): wires the sizer, gates, engine, and runtime
//! manager into one run, the way `bin/fc-outbox-processor`'s `main` wires a
//! processor and a shutdown signal together — lifted here into a reusable
//! library entry point instead of a binary's `main`.

pub mod executor;
pub mod hooks;

pub use executor::{PipelineConfig, PipelineExecutor};
pub use hooks::{HookedTracker, NoopHooks, PipelineHooks};
