//! Runtime Manager (C6): one tick evaluates every goal, resolves proposals
//! into a single adjustment, and applies it through `EngineControl`
//! (spec.md §4.6). Grounded on `fc-scheduler::poller::PendingJobPoller::poll`
//! — a stateless, externally-scheduled `async fn tick(&self)`; tick cadence
//! itself lives one layer up, in `bx-executor`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use bx_common::{ConcurrencyLimits, ConcurrencySettings, DialAdjustment, GoalEvaluation, Severity};
use bx_engine::EngineControl;
use bx_goals::Goal;
use bx_metrics::MetricsCollector;
use bx_strategies::Strategy;

/// Pairs a goal with the strategy that reacts to its evaluation.
pub struct GoalBinding {
    pub goal: Box<dyn Goal>,
    pub strategy: Box<dyn Strategy>,
}

impl GoalBinding {
    pub fn new(goal: Box<dyn Goal>, strategy: Box<dyn Strategy>) -> Self {
        Self { goal, strategy }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    /// Window, following an applied adjustment, in which a newly proposed
    /// adjustment with the opposite work-item sign is suppressed — a
    /// same-sign proposal (continuing to grow or continuing to shrink) is
    /// never held back by this (spec.md §4.6 step 7).
    pub cooldown: Duration,
}

struct LastAdjustment {
    at: Instant,
    work_item_sign: i32,
}

fn sign(delta: i64) -> i32 {
    delta.signum() as i32
}

/// One candidate adjustment plus the metadata needed for tie-breaking
/// (spec.md §4.6 step 5).
struct Candidate<'a> {
    adjustment: &'a DialAdjustment,
    severity: Severity,
    order: usize,
}

fn better(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.adjustment
        .work_item_magnitude()
        .cmp(&b.adjustment.work_item_magnitude())
        .then_with(|| a.adjustment.processing_magnitude().cmp(&b.adjustment.processing_magnitude()))
        .then_with(|| a.severity.cmp(&b.severity))
        .then_with(|| b.order.cmp(&a.order)) // earlier insertion wins ties
}

/// Stateless between ticks except for the last-applied-adjustment record
/// (spec.md §4.6's closing line).
pub struct RuntimeManager {
    bindings: Vec<GoalBinding>,
    limits: ConcurrencyLimits,
    config: ManagerConfig,
    last_adjustment: Mutex<Option<LastAdjustment>>,
}

impl RuntimeManager {
    pub fn new(bindings: Vec<GoalBinding>, limits: ConcurrencyLimits, config: ManagerConfig) -> Self {
        Self {
            bindings,
            limits,
            config,
            last_adjustment: Mutex::new(None),
        }
    }

    pub fn evaluate(&self, collector: &MetricsCollector) -> Vec<GoalEvaluation> {
        let snapshot = collector.snapshot();
        self.bindings.iter().map(|b| b.goal.evaluate(&snapshot)).collect()
    }

    /// One manager tick. Cadence is externally scheduled (spec.md §4.6).
    pub async fn tick(&self, collector: &MetricsCollector, engine: &dyn EngineControl) {
        let evaluations = self.evaluate(collector);

        if let Some(critical) = evaluations
            .iter()
            .find(|e| e.severity == Severity::Critical && e.is_violated())
        {
            info!(goal = critical.goal_name, "critical goal violated, aborting run");
            engine.abort(critical.goal_name.to_string());
            return;
        }

        if engine.is_aborted() {
            return;
        }

        let proposals: Vec<(DialAdjustment, Severity)> = self
            .bindings
            .iter()
            .zip(evaluations.iter())
            .map(|(binding, eval)| (binding.strategy.propose(eval), eval.severity))
            .filter(|(adj, _)| !adj.is_no_change())
            .collect();

        if proposals.is_empty() {
            debug!("no proposals this tick");
            return;
        }

        let candidates: Vec<Candidate> = proposals
            .iter()
            .enumerate()
            .map(|(order, (adjustment, severity))| Candidate {
                adjustment,
                severity: *severity,
                order,
            })
            .collect();

        let decreases: Vec<&Candidate> = candidates.iter().filter(|c| c.adjustment.is_decrease()).collect();

        let chosen = if !decreases.is_empty() {
            decreases.into_iter().max_by(|a, b| better(a, b))
        } else {
            candidates
                .iter()
                .filter(|c| c.adjustment.is_increase())
                .max_by(|a, b| better(a, b))
        };

        let Some(chosen) = chosen else {
            return;
        };

        let current = engine.current_settings();
        let new_wi = self.limits.clamp_work_item(
            current.work_item_concurrency as i64 + chosen.adjustment.work_item_delta as i64,
        );
        let new_proc = self.limits.clamp_processing(
            current.processing_concurrency as i64 + chosen.adjustment.processing_delta as i64,
        );

        if new_wi == current.work_item_concurrency && new_proc == current.processing_concurrency {
            debug!("clamped adjustment reduced to zero on both axes, skipping");
            return;
        }

        let proposed_sign = sign(new_wi as i64 - current.work_item_concurrency as i64);

        {
            let last = self.last_adjustment.lock().unwrap();
            if let Some(prev) = last.as_ref() {
                let opposite_sign = proposed_sign != 0 && prev.work_item_sign != 0 && proposed_sign != prev.work_item_sign;
                if opposite_sign && prev.at.elapsed() < self.config.cooldown {
                    warn!(
                        reason = chosen.adjustment.reason.as_str(),
                        "skipping adjustment: opposite-sign proposal within cooldown of the previous applied adjustment"
                    );
                    return;
                }
            }
        }

        engine
            .adjust_concurrency(ConcurrencySettings::new(new_wi, new_proc))
            .await;

        let mut last = self.last_adjustment.lock().unwrap();
        *last = Some(LastAdjustment {
            at: Instant::now(),
            work_item_sign: proposed_sign,
        });
    }
}
