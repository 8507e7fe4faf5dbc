//! Configuration loader with file and environment variable support.

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::ConfigError;
use crate::sections::RunConfig;

const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "bx.toml",
    "./config/config.toml",
    "/etc/bx/config.toml",
];

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Loads defaults, overlays an optional config file, then applies
    /// `BX_*` environment variable overrides, and validates the result.
    pub fn load(&self) -> Result<RunConfig, ConfigError> {
        let mut config = RunConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "loading configuration from file");
            config = RunConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("BX_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn apply_env_overrides(&self, config: &mut RunConfig) {
        if let Ok(val) = env::var("BX_LIMITS_MIN_WORK_ITEM") {
            if let Ok(parsed) = val.parse() {
                config.limits.min_work_item = parsed;
            }
        }
        if let Ok(val) = env::var("BX_LIMITS_MAX_WORK_ITEM") {
            if let Ok(parsed) = val.parse() {
                config.limits.max_work_item = parsed;
            }
        }
        if let Ok(val) = env::var("BX_LIMITS_MIN_PROCESSING") {
            if let Ok(parsed) = val.parse() {
                config.limits.min_processing = parsed;
            }
        }
        if let Ok(val) = env::var("BX_LIMITS_MAX_PROCESSING") {
            if let Ok(parsed) = val.parse() {
                config.limits.max_processing = parsed;
            }
        }

        if let Ok(val) = env::var("BX_BATCH_SIZE") {
            if let Ok(parsed) = val.parse() {
                config.batch.size = parsed;
            }
        }

        if let Ok(val) = env::var("BX_SIZING_STRATEGY") {
            config.sizing.strategy = val;
        }
        if let Ok(val) = env::var("BX_SIZING_ESTIMATED_RECORDS_PER_ITEM") {
            if let Ok(parsed) = val.parse() {
                config.sizing.estimated_records_per_item = Some(parsed);
            }
        }

        if let Ok(val) = env::var("BX_MANAGER_TICK_PERIOD_MS") {
            if let Ok(parsed) = val.parse() {
                config.manager.tick_period_ms = parsed;
            }
        }
        if let Ok(val) = env::var("BX_MANAGER_COOLDOWN_SECS") {
            if let Ok(parsed) = val.parse() {
                config.manager.cooldown_secs = parsed;
            }
        }

        if let Ok(val) = env::var("BX_GOALS_PERFORMANCE_DEADLINE_SECS") {
            if let Ok(parsed) = val.parse() {
                config.goals.performance.deadline_secs = parsed;
            }
        }
        if let Ok(val) = env::var("BX_GOALS_PERFORMANCE_MIN_RATE_PER_MINUTE") {
            if let Ok(parsed) = val.parse() {
                config.goals.performance.min_rate_per_minute = parsed;
            }
        }
        if let Ok(val) = env::var("BX_GOALS_PERFORMANCE_TOLERANCE") {
            if let Ok(parsed) = val.parse() {
                config.goals.performance.tolerance = parsed;
            }
        }

        if let Ok(val) = env::var("BX_GOALS_RESOURCE_MAX_DB_CONNECTIONS") {
            if let Ok(parsed) = val.parse() {
                config.goals.resource.max_db_connections = parsed;
            }
        }
        if let Ok(val) = env::var("BX_GOALS_RESOURCE_MAX_DB_UTILIZATION") {
            if let Ok(parsed) = val.parse() {
                config.goals.resource.max_db_utilization = parsed;
            }
        }
        if let Ok(val) = env::var("BX_GOALS_RESOURCE_MAX_HEAP_UTILIZATION") {
            if let Ok(parsed) = val.parse() {
                config.goals.resource.max_heap_utilization = parsed;
            }
        }

        if let Ok(val) = env::var("BX_GOALS_ERROR_MAX_TOTAL_ERROR_COUNT") {
            if let Ok(parsed) = val.parse() {
                config.goals.error.max_total_error_count = parsed;
            }
        }
        if let Ok(val) = env::var("BX_GOALS_ERROR_CRITICAL_ERROR_TYPES") {
            config.goals.error.critical_error_types =
                val.split(',').map(|s| s.trim().to_string()).collect();
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults_when_no_file_present() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("missing.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config.batch.size, RunConfig::default().batch.size);
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bx.toml");
        std::fs::write(&path, "[batch]\nsize = 25\n").unwrap();

        env::set_var("BX_BATCH_SIZE", "75");
        let config = ConfigLoader::with_path(&path).load().unwrap();
        env::remove_var("BX_BATCH_SIZE");

        assert_eq!(config.batch.size, 75);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var("BX_BATCH_SIZE", "0");
        let result = ConfigLoader::with_path(dir.path().join("missing.toml")).load();
        env::remove_var("BX_BATCH_SIZE");

        assert!(result.is_err());
    }
}
