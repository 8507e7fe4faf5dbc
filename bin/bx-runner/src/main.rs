//! bx-runner: a filesystem-backed CLI front end for the pipeline executor.
//!
//! Reads every regular file directly under an input directory as one work
//! item, expands each file into newline-delimited records, and processes
//! each record by trimming it. Concurrency is governed by the same
//! goals/strategies/manager loop as any other pipeline run.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BX_INPUT_DIR` | - | Directory to read (required; or first CLI arg) |
//! | `BX_FILE_SUFFIX` | - | Only read files ending in this suffix |
//! | `BX_AVAILABLE_DB_CONNECTIONS` | `20` | Capacity reading used for sizing |
//! | `BX_METRICS_PORT` | `9090` | Health/metrics port |
//! | `BX_CONFIG` | - | Path to a TOML config file |
//! | `RUST_LOG` | `info` | Log level |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use bx_common::{ExecutionContext, ProcessingResult};
use bx_config::RunConfig;
use bx_engine::{BatchProcessor, EngineError, ProgressTracker, WorkItemFetcher, WorkItemReader};
use bx_executor::{PipelineConfig, PipelineExecutor};
use bx_goals::{ErrorGoal, PerformanceGoal, ResourceGoal};
use bx_manager::GoalBinding;
use bx_metrics::ResourceProbe;
use bx_sizer::{ResourceSnapshot, WorkloadAwareStrategy};
use bx_strategies::{ErrorStrategy, PerformanceStrategy, ResourceStrategy};

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Lists the regular files directly under a directory; one work item per
/// file. Honors an optional `file_suffix` context value (e.g. `.log`) as a
/// simple glob: only files ending in that suffix are included.
struct DirectoryFetcher {
    dir: PathBuf,
}

#[async_trait]
impl WorkItemFetcher<PathBuf> for DirectoryFetcher {
    async fn fetch_work_items(&self, ctx: &ExecutionContext) -> Result<Vec<PathBuf>, EngineError> {
        let suffix = ctx.get("file_suffix");
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| EngineError::Batch(format!("failed to read {}: {e}", self.dir.display())))?;

        let mut items = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| EngineError::Batch(e.to_string()))?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(suffix) = suffix {
                if !path.to_string_lossy().ends_with(suffix) {
                    continue;
                }
            }
            items.push(path);
        }
        items.sort();
        Ok(items)
    }
}

/// Expands one file into its non-empty lines.
struct LineReader;

#[async_trait]
impl WorkItemReader<PathBuf, String> for LineReader {
    async fn read_work_item(&self, item: &PathBuf, _ctx: &ExecutionContext) -> Result<Vec<String>, EngineError> {
        let content = tokio::fs::read_to_string(item)
            .await
            .map_err(|e| EngineError::TransientItem(format!("{}: {e}", item.display())))?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}

/// Trims each record; an empty result after trimming counts as a failure.
struct TrimProcessor;

#[async_trait]
impl BatchProcessor<String, String> for TrimProcessor {
    async fn process_batch(&self, records: &[String], _ctx: &ExecutionContext) -> Vec<ProcessingResult<String>> {
        records
            .iter()
            .map(|record| {
                let trimmed = record.trim().to_string();
                if trimmed.is_empty() {
                    ProcessingResult::Failure("blank record".to_string())
                } else {
                    ProcessingResult::Success(trimmed)
                }
            })
            .collect()
    }
}

/// Logs work item lifecycle events via `tracing`.
struct LoggingTracker;

impl ProgressTracker<PathBuf, String> for LoggingTracker {
    fn on_work_item_start(&self, item: &PathBuf) {
        info!(path = %item.display(), "work item started");
    }

    fn on_work_item_complete(&self, item: &PathBuf, record_count: usize, results: &[ProcessingResult<String>]) {
        let failures = results.iter().filter(|r| r.is_failure()).count();
        info!(path = %item.display(), record_count, failures, "work item complete");
    }

    fn on_work_item_failure(&self, item: &PathBuf, error: &EngineError) {
        tracing::warn!(path = %item.display(), %error, "work item failed");
    }

    fn report_progress(&self, processed: u64, total: u64) {
        info!(processed, total, "progress");
    }
}

/// A resource probe that reads current process memory pressure from
/// `/proc/self/status`, falling back to zero when unavailable. DB
/// connection usage isn't tracked by this runner, so it always reports zero.
struct ProcessResourceProbe;

impl ResourceProbe for ProcessResourceProbe {
    fn active_db_connections(&self) -> u32 {
        0
    }

    fn heap_utilization(&self) -> f64 {
        read_proc_self_vm_rss_fraction().unwrap_or(0.0)
    }
}

fn read_proc_self_vm_rss_fraction() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let kb: u64 = status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    // No reliable total-memory figure without a platform-specific probe;
    // 4 GiB is a conservative assumed ceiling for utilization purposes.
    const ASSUMED_CEILING_KB: f64 = 4.0 * 1024.0 * 1024.0;
    Some((kb as f64 / ASSUMED_CEILING_KB).min(1.0))
}

async fn health_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "UP" }))
}

async fn metrics_handler() -> String {
    "# HELP bx_runner_up bx-runner is up\n# TYPE bx_runner_up gauge\nbx_runner_up 1\n".to_string()
}

fn build_bindings(config: &RunConfig) -> Vec<GoalBinding> {
    vec![
        GoalBinding::new(
            Box::new(PerformanceGoal::new(config.goals.performance.build())),
            Box::new(PerformanceStrategy),
        ),
        GoalBinding::new(
            Box::new(ResourceGoal::new(config.goals.resource.build())),
            Box::new(ResourceStrategy),
        ),
        GoalBinding::new(
            Box::new(ErrorGoal::new(config.goals.error.build())),
            Box::new(ErrorStrategy),
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    bx_common::logging::init_logging("bx-runner");

    let input_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BX_INPUT_DIR").ok())
        .context("usage: bx-runner <input-dir> (or set BX_INPUT_DIR)")?;
    let input_dir = PathBuf::from(input_dir);
    if !input_dir.is_dir() {
        anyhow::bail!("{} is not a directory", input_dir.display());
    }

    let run_config = RunConfig::load().context("failed to load configuration")?;
    let available_db_connections: u32 = env_or_parse("BX_AVAILABLE_DB_CONNECTIONS", 20);
    let metrics_port: u16 = env_or_parse("BX_METRICS_PORT", 9090);

    info!(input_dir = %input_dir.display(), "starting bx-runner");

    let pipeline_config = PipelineConfig {
        batch_size: run_config.batch.size,
        limits: run_config.limits.build()?,
        sizing: run_config.sizing.build()?,
        manager: run_config.manager.build(),
        tick_period: run_config.manager.tick_period(),
    };

    let executor: PipelineExecutor<PathBuf, String, String> = PipelineExecutor::new(
        pipeline_config,
        build_bindings(&run_config),
        Box::new(WorkloadAwareStrategy),
        ResourceSnapshot::new(available_db_connections),
        Arc::new(ProcessResourceProbe) as Arc<dyn ResourceProbe>,
    );

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
    let metrics_app = axum::Router::new()
        .route("/health", axum::routing::get(health_handler))
        .route("/metrics", axum::routing::get(metrics_handler));
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics server on {metrics_addr}"))?;
    info!(%metrics_addr, "metrics server listening");
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let metrics_handle = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_app)
            .with_graceful_shutdown(async move {
                let _ = (&mut shutdown_rx).await;
            })
            .await
            .ok();
    });

    let mut ctx_builder = ExecutionContext::builder().set("input_dir", input_dir.display().to_string());
    if let Ok(suffix) = std::env::var("BX_FILE_SUFFIX") {
        ctx_builder = ctx_builder.set("file_suffix", suffix);
    }
    let ctx = Arc::new(ctx_builder.build());
    let fetcher = Arc::new(DirectoryFetcher { dir: input_dir.clone() });
    let reader = Arc::new(LineReader);
    let processor = Arc::new(TrimProcessor);
    let tracker = Arc::new(LoggingTracker);

    let result = executor.run(ctx, fetcher, reader, processor, tracker).await?;

    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(5), metrics_handle).await;

    info!(
        success = result.success,
        work_items_processed = result.work_items_processed,
        total_work_items = result.total_work_items,
        records_processed = result.records_processed,
        total_errors = result.total_errors,
        "run complete"
    );
    println!(
        "{}",
        serde_json::json!({
            "success": result.success,
            "abort_reason": result.abort_reason,
            "work_items_processed": result.work_items_processed,
            "total_work_items": result.total_work_items,
            "records_processed": result.records_processed,
            "total_errors": result.total_errors,
            "duration_ms": result.duration.as_millis(),
        })
    );

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
