//! # Check Recorder
//!
//! Aggregates the pass/fail checks and step latencies produced by every VU
//! of a run, and renders the end-of-run summary.
//!
//! The recorder is a cheap cloneable handle; all VUs share one instance.
//! Per-name aggregates live in `DashMap`s so that VUs recording different
//! checks do not contend on a single lock. Every observation is mirrored to
//! the `metrics` facade; with no exporter installed those calls are no-ops.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two workloads a VU can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    /// Produces log entries.
    Sign,
    /// Reads and validates log entries.
    Verify,
}

impl Workload {
    /// Returns the workload label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Verify => "verify",
        }
    }
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single workflow iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationOutcome {
    /// Every attempted stage succeeded.
    Completed,
    /// At least one stage failed.
    Failed,
    /// Nothing to do (empty identifier source).
    Idle,
}

impl IterationOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Idle => "idle",
        }
    }
}

/// Pass/fail counts for one named check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    /// Fraction of observations that passed, or `None` if never observed.
    pub fn pass_rate(&self) -> Option<f64> {
        let total = self.passes + self.fails;
        (total > 0).then(|| self.passes as f64 / total as f64)
    }
}

/// Iteration counts for one workload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationTally {
    pub completed: u64,
    pub failed: u64,
    pub idle: u64,
}

/// Latency distribution of one step, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl StepStats {
    fn from_samples(samples: &mut [Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();
        let ms = |d: Duration| d.as_secs_f64() * 1_000.0;
        let percentile = |p: f64| {
            let rank = ((p / 100.0) * samples.len() as f64).ceil() as usize;
            ms(samples[rank.clamp(1, samples.len()) - 1])
        };
        let total: Duration = samples.iter().sum();
        Some(Self {
            count: samples.len() as u64,
            min_ms: ms(samples[0]),
            mean_ms: ms(total) / samples.len() as f64,
            p50_ms: percentile(50.0),
            p95_ms: percentile(95.0),
            p99_ms: percentile(99.0),
            max_ms: ms(samples[samples.len() - 1]),
        })
    }
}

/// End-of-run aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub iterations: BTreeMap<Workload, IterationTally>,
    pub checks: BTreeMap<String, CheckTally>,
    pub steps: BTreeMap<String, StepStats>,
    pub pool_size: usize,
}

impl RunSummary {
    /// Total failed checks across all names.
    pub fn failed_checks(&self) -> u64 {
        self.checks.values().map(|t| t.fails).sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "scenario {} (run {}) finished after {:.1}s",
            self.scenario, self.run_id, self.elapsed_secs
        )?;
        for (workload, tally) in &self.iterations {
            writeln!(
                f,
                "  iterations[{workload}]: {} completed, {} failed, {} idle",
                tally.completed, tally.failed, tally.idle
            )?;
        }
        writeln!(f, "  checks:")?;
        for (name, tally) in &self.checks {
            let mark = if tally.fails == 0 { "ok" } else { "FAIL" };
            let rate = tally.pass_rate().unwrap_or(0.0) * 100.0;
            writeln!(
                f,
                "    [{mark:>4}] {name}: {rate:.2}% ({} passed, {} failed)",
                tally.passes, tally.fails
            )?;
        }
        writeln!(f, "  steps:")?;
        for (name, s) in &self.steps {
            writeln!(
                f,
                "    {name}: n={} avg={:.1}ms min={:.1}ms p50={:.1}ms p95={:.1}ms p99={:.1}ms max={:.1}ms",
                s.count, s.mean_ms, s.min_ms, s.p50_ms, s.p95_ms, s.p99_ms, s.max_ms
            )?;
        }
        write!(f, "  entry pool size: {}", self.pool_size)
    }
}

#[derive(Debug)]
struct Inner {
    run_id: Uuid,
    scenario: String,
    started_at: DateTime<Utc>,
    started: Instant,
    checks: DashMap<String, CheckTally>,
    steps: DashMap<String, Vec<Duration>>,
    sign_iterations: [AtomicU64; 3],
    verify_iterations: [AtomicU64; 3],
}

/// Shared recorder of checks, step latencies, and iteration outcomes.
#[derive(Debug, Clone)]
pub struct CheckRecorder {
    inner: Arc<Inner>,
}

impl CheckRecorder {
    /// Start recording a run of the named scenario.
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                run_id: Uuid::new_v4(),
                scenario: scenario.into(),
                started_at: Utc::now(),
                started: Instant::now(),
                checks: DashMap::new(),
                steps: DashMap::new(),
                sign_iterations: Default::default(),
                verify_iterations: Default::default(),
            }),
        }
    }

    /// Record a named check and return `passed`, so callers can gate on it.
    pub fn check(&self, name: &str, passed: bool) -> bool {
        {
            let mut tally = self.inner.checks.entry(name.to_string()).or_default();
            if passed {
                tally.passes += 1;
            } else {
                tally.fails += 1;
            }
        }
        metrics::counter!(
            "tasperf_checks_total",
            "check" => name.to_string(),
            "result" => if passed { "pass" } else { "fail" }
        )
        .increment(1);
        passed
    }

    /// Record the latency of one step.
    pub fn observe(&self, step: &str, elapsed: Duration) {
        self.inner
            .steps
            .entry(step.to_string())
            .or_default()
            .push(elapsed);
        metrics::histogram!("tasperf_step_duration_seconds", "step" => step.to_string())
            .record(elapsed.as_secs_f64());
    }

    /// Record how one iteration of `workload` ended.
    pub fn iteration(&self, workload: Workload, outcome: IterationOutcome) {
        let counters = match workload {
            Workload::Sign => &self.inner.sign_iterations,
            Workload::Verify => &self.inner.verify_iterations,
        };
        let slot = match outcome {
            IterationOutcome::Completed => 0,
            IterationOutcome::Failed => 1,
            IterationOutcome::Idle => 2,
        };
        counters[slot].fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "tasperf_iterations_total",
            "workload" => workload.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// Tally for a single check name.
    pub fn tally(&self, name: &str) -> CheckTally {
        self.inner
            .checks
            .get(name)
            .map(|t| *t)
            .unwrap_or_default()
    }

    /// Number of latency samples recorded for `step`.
    pub fn step_count(&self, step: &str) -> usize {
        self.inner.steps.get(step).map(|s| s.len()).unwrap_or(0)
    }

    /// Iteration counts for `workload`.
    pub fn iterations(&self, workload: Workload) -> IterationTally {
        let counters = match workload {
            Workload::Sign => &self.inner.sign_iterations,
            Workload::Verify => &self.inner.verify_iterations,
        };
        IterationTally {
            completed: counters[0].load(Ordering::Relaxed),
            failed: counters[1].load(Ordering::Relaxed),
            idle: counters[2].load(Ordering::Relaxed),
        }
    }

    /// Snapshot all aggregates.
    pub fn summary(&self, pool_size: usize) -> RunSummary {
        let checks = self
            .inner
            .checks
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        // Copy out first; sorting happens after every shard guard is released.
        let sampled: Vec<(String, Vec<Duration>)> = self
            .inner
            .steps
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let steps = sampled
            .into_iter()
            .filter_map(|(step, mut samples)| {
                StepStats::from_samples(&mut samples).map(|s| (step, s))
            })
            .collect();
        let mut iterations = BTreeMap::new();
        for workload in [Workload::Sign, Workload::Verify] {
            let tally = self.iterations(workload);
            if tally != IterationTally::default() {
                iterations.insert(workload, tally);
            }
        }
        RunSummary {
            run_id: self.inner.run_id,
            scenario: self.inner.scenario.clone(),
            started_at: self.inner.started_at,
            elapsed_secs: self.inner.started.elapsed().as_secs_f64(),
            iterations,
            checks,
            steps,
            pool_size,
        }
    }
}
