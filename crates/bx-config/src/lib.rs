mod error;
mod loader;
mod sections;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use sections::{
    BatchSection, ErrorGoalSection, GoalsSection, LimitsSection, ManagerSection,
    PerformanceGoalSection, ResourceGoalSection, RunConfig, SizingSection,
};
