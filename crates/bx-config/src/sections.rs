//! Configuration sections for one run, mirroring `fc_config::AppConfig`'s
//! one-struct-per-concern layout: every section derives `Default`, every
//! field has a sensible production default, and `#[serde(default)]` lets a
//! TOML file override only the fields it mentions.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bx_common::ConcurrencyLimits;
use bx_goals::{ErrorGoalConfig, PerformanceGoalConfig, ResourceGoalConfig};
use bx_manager::ManagerConfig;
use bx_sizer::SizingStrategy;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub limits: LimitsSection,
    pub batch: BatchSection,
    pub sizing: SizingSection,
    pub manager: ManagerSection,
    pub goals: GoalsSection,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            limits: LimitsSection::default(),
            batch: BatchSection::default(),
            sizing: SizingSection::default(),
            manager: ManagerSection::default(),
            goals: GoalsSection::default(),
        }
    }
}

impl RunConfig {
    /// Loads a `RunConfig` from a TOML file, without applying env overrides
    /// or validating it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads configuration the standard way: defaults, optional file,
    /// `BX_*` env overrides, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        crate::loader::ConfigLoader::new().load()
    }

    /// Rejects an invalid configuration before a run starts, so no side
    /// effects are observable from a bad config (spec.md §7's
    /// `ConfigurationError`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.build()?;
        self.sizing.build()?;
        if self.batch.size == 0 {
            return Err(ConfigError::Validation("batch.size must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.goals.performance.tolerance) {
            return Err(ConfigError::Validation(
                "goals.performance.tolerance must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.goals.resource.max_db_utilization) {
            return Err(ConfigError::Validation(
                "goals.resource.max_db_utilization must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.goals.resource.max_heap_utilization) {
            return Err(ConfigError::Validation(
                "goals.resource.max_heap_utilization must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub min_work_item: u32,
    pub max_work_item: u32,
    pub min_processing: u32,
    pub max_processing: u32,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            min_work_item: 1,
            max_work_item: 20,
            min_processing: 1,
            max_processing: 50,
        }
    }
}

impl LimitsSection {
    pub fn build(&self) -> Result<ConcurrencyLimits, ConfigError> {
        ConcurrencyLimits::new(
            self.min_work_item,
            self.max_work_item,
            self.min_processing,
            self.max_processing,
        )
        .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub size: usize,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self { size: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingSection {
    /// One of `static`, `estimated`, `dynamic`.
    pub strategy: String,
    pub estimated_records_per_item: Option<u64>,
}

impl Default for SizingSection {
    fn default() -> Self {
        Self {
            strategy: "static".to_string(),
            estimated_records_per_item: None,
        }
    }
}

impl SizingSection {
    pub fn build(&self) -> Result<SizingStrategy, ConfigError> {
        match self.strategy.as_str() {
            "static" => Ok(SizingStrategy::Static),
            "estimated" => {
                let estimated_records_per_item = self.estimated_records_per_item.ok_or_else(|| {
                    ConfigError::Validation(
                        "sizing.estimated_records_per_item is required when sizing.strategy = \"estimated\"".into(),
                    )
                })?;
                Ok(SizingStrategy::Estimated {
                    estimated_records_per_item,
                })
            }
            "dynamic" => Ok(SizingStrategy::Dynamic),
            other => Err(ConfigError::Validation(format!(
                "unknown sizing.strategy: {other} (expected static, estimated, or dynamic)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSection {
    pub tick_period_ms: u64,
    pub cooldown_secs: u64,
}

impl Default for ManagerSection {
    fn default() -> Self {
        Self {
            tick_period_ms: 5_000,
            cooldown_secs: 30,
        }
    }
}

impl ManagerSection {
    pub fn build(&self) -> ManagerConfig {
        ManagerConfig {
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalsSection {
    pub performance: PerformanceGoalSection,
    pub resource: ResourceGoalSection,
    pub error: ErrorGoalSection,
}

impl Default for GoalsSection {
    fn default() -> Self {
        Self {
            performance: PerformanceGoalSection::default(),
            resource: ResourceGoalSection::default(),
            error: ErrorGoalSection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceGoalSection {
    pub deadline_secs: u64,
    pub min_rate_per_minute: f64,
    pub tolerance: f64,
}

impl Default for PerformanceGoalSection {
    fn default() -> Self {
        Self {
            deadline_secs: 3_600,
            min_rate_per_minute: 10.0,
            tolerance: 0.8,
        }
    }
}

impl PerformanceGoalSection {
    pub fn build(&self) -> PerformanceGoalConfig {
        PerformanceGoalConfig {
            deadline: Duration::from_secs(self.deadline_secs),
            min_rate_per_minute: self.min_rate_per_minute,
            tolerance: self.tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceGoalSection {
    pub max_db_connections: u32,
    pub max_db_utilization: f64,
    pub max_heap_utilization: f64,
}

impl Default for ResourceGoalSection {
    fn default() -> Self {
        Self {
            max_db_connections: 100,
            max_db_utilization: 0.8,
            max_heap_utilization: 0.9,
        }
    }
}

impl ResourceGoalSection {
    pub fn build(&self) -> ResourceGoalConfig {
        ResourceGoalConfig {
            max_db_connections: self.max_db_connections,
            max_db_utilization: self.max_db_utilization,
            max_heap_utilization: self.max_heap_utilization,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorGoalSection {
    pub max_error_rate_per_file: f64,
    pub max_total_error_count: u64,
    pub critical_error_types: Vec<String>,
}

impl Default for ErrorGoalSection {
    fn default() -> Self {
        Self {
            max_error_rate_per_file: 0.0,
            max_total_error_count: 1_000,
            critical_error_types: Vec::new(),
        }
    }
}

impl ErrorGoalSection {
    pub fn build(&self) -> ErrorGoalConfig {
        ErrorGoalConfig {
            max_error_rate_per_file: self.max_error_rate_per_file,
            max_total_error_count: self.max_total_error_count,
            critical_error_types: self.critical_error_types.iter().cloned().collect(),
        }
    }
}
