//! Execution context: a small, concurrency-safe key/value bag passed to the
//! fetcher/reader/processor of a run (folder path, file pattern, and so on).
//!
//! Readable by many tasks concurrently; mutated only before `execute()` is
//! called (via the builder), never afterward.

use std::collections::HashMap;
use std::sync::Arc;

/// Immutable, cheaply-cloneable context shared across all tasks of a run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    values: Arc<HashMap<String, String>>,
}

impl ExecutionContext {
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Builder for `ExecutionContext`. Values may only be set before the context
/// is built and handed to a run.
#[derive(Debug, Default)]
pub struct ExecutionContextBuilder {
    values: HashMap<String, String>,
}

impl ExecutionContextBuilder {
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            values: Arc::new(self.values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_values() {
        let ctx = ExecutionContext::builder()
            .set("folder", "/data")
            .set("pattern", "*.csv")
            .build();

        assert_eq!(ctx.get("folder"), Some("/data"));
        assert_eq!(ctx.get("pattern"), Some("*.csv"));
        assert_eq!(ctx.get("missing"), None);
        assert_eq!(ctx.get_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn clone_shares_underlying_map() {
        let ctx = ExecutionContext::builder().set("k", "v").build();
        let cloned = ctx.clone();
        assert_eq!(cloned.get("k"), Some("v"));
    }
}
