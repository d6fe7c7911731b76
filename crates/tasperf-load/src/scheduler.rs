//! # Dual-Workload Scheduler
//!
//! Runs up to two fixed-size VU pools, each looping one workflow until its
//! own deadline. Iterations are sequential within a VU and concurrent across
//! VUs and pools. The only state shared between the pools is the
//! [`EntryPool`]: signing VUs append to it, verifying VUs sample it.
//!
//! ## Run Phases
//!
//! 1. **Setup**: build workflows, load the identifier file (verify-only
//!    runs), open the identifier sink, and perform the one-time token
//!    exchange. Any failure here aborts the run and no VU is started.
//! 2. **Workload**: spawn every VU into a [`JoinSet`]. VUs check their
//!    deadline at iteration boundaries; an in-flight iteration always
//!    finishes.
//! 3. **Teardown**: join all VUs, drain the sink (or, in verify-only runs,
//!    write the sampled pool), snapshot the recorder.
//!
//! Verification VUs may start before any entry exists. Until the first
//! publish their iterations are idle no-ops.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tasperf_client::{OidcCredentials, TasClient};
use tasperf_core::{CheckRecorder, EntryPool, HarnessError, IterationOutcome, RunSummary, Workload};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::scenario::{Scenario, ScenarioConfig};
use crate::sign::SigningWorkflow;
use crate::sink::EntrySink;
use crate::token::{TokenMode, TokenSource};
use crate::verify::{VerifyOutcome, VerifyWorkflow};

/// Pause after an idle verification iteration, so an empty pool does not
/// turn a VU into a busy loop.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Size and duration of one VU pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub vus: usize,
    pub duration: Duration,
}

/// Fully resolved plan for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub scenario: Scenario,
    pub sign: Option<WorkloadSpec>,
    pub verify: Option<WorkloadSpec>,
    pub token_mode: TokenMode,
    pub payload_size: Option<String>,
    pub timestamp_branch: bool,
    /// Fetch the TSA chain in every verification iteration.
    pub fetch_cert_chain: bool,
    /// Static identifier source. When `None`, verifiers sample the live pool.
    pub uuid_file: Option<PathBuf>,
    /// Append published identifiers here. A run without signing VUs writes
    /// the identifiers it sampled from instead.
    pub uuid_out: Option<PathBuf>,
}

impl RunPlan {
    /// Derive the plan for `scenario` from resolved configuration.
    pub fn new(scenario: Scenario, cfg: &ScenarioConfig) -> Result<Self, HarnessError> {
        cfg.validate(scenario)?;
        let sign = scenario.signs().then(|| WorkloadSpec {
            vus: cfg.sign_vus,
            duration: cfg.sign_duration(),
        });
        let verify = scenario.verifies().then(|| WorkloadSpec {
            vus: cfg.verify_vus,
            duration: cfg.verify_duration(),
        });
        Ok(Self {
            scenario,
            sign,
            verify,
            token_mode: cfg.token_mode_for(scenario),
            payload_size: cfg.payload_size_for(scenario),
            timestamp_branch: cfg.timestamp_branch_for(scenario),
            fetch_cert_chain: scenario == Scenario::Verify,
            uuid_file: (scenario == Scenario::Verify).then(|| cfg.uuid_file.clone()),
            uuid_out: cfg.uuid_out.clone(),
        })
    }
}

/// Execute `plan` and return the aggregate summary.
///
/// Returns `Err` only for setup failures; failed checks during the workload
/// phase are reported in the summary.
pub async fn run(
    plan: RunPlan,
    client: TasClient,
    creds: OidcCredentials,
    recorder: CheckRecorder,
) -> Result<RunSummary, HarnessError> {
    let pool = match &plan.uuid_file {
        Some(path) => {
            let pool = EntryPool::load(path)?;
            if pool.is_empty() {
                tracing::error!(
                    path = %path.display(),
                    "identifier file is empty; run a signing scenario first"
                );
            }
            pool
        }
        None => EntryPool::new(),
    };

    let signing = match plan.sign {
        Some(spec) => {
            let workflow = SigningWorkflow::new(
                client.clone(),
                recorder.clone(),
                plan.payload_size.clone(),
                plan.timestamp_branch,
            )?;
            let tokens = TokenSource::prepare(&client, creds, plan.token_mode).await?;
            Some((spec, Arc::new(workflow), Arc::new(tokens)))
        }
        None => None,
    };

    let (sink, writer) = match &plan.uuid_out {
        Some(path) if plan.sign.is_some() => {
            let (sink, writer) = EntrySink::open(path).await?;
            (Some(sink), Some(writer))
        }
        _ => (None, None),
    };

    let mut vus = JoinSet::new();
    let start = Instant::now();

    if let Some((spec, workflow, tokens)) = signing {
        tracing::info!(vus = spec.vus, duration = ?spec.duration, "starting signing workload");
        let deadline = start + spec.duration;
        for vu in 0..spec.vus {
            vus.spawn(signing_vu(
                vu,
                deadline,
                Arc::clone(&workflow),
                Arc::clone(&tokens),
                pool.clone(),
                sink.clone(),
                recorder.clone(),
            ));
        }
    }
    drop(sink);

    if let Some(spec) = plan.verify {
        tracing::info!(vus = spec.vus, duration = ?spec.duration, "starting verification workload");
        let deadline = start + spec.duration;
        let workflow = Arc::new(VerifyWorkflow::new(
            client.clone(),
            recorder.clone(),
            plan.fetch_cert_chain,
        ));
        for vu in 0..spec.vus {
            vus.spawn(verifying_vu(
                vu,
                deadline,
                Arc::clone(&workflow),
                pool.clone(),
                recorder.clone(),
            ));
        }
    }

    while let Some(joined) = vus.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "virtual user terminated abnormally");
        }
    }

    match (writer, &plan.uuid_out) {
        (Some(writer), _) => {
            writer.finish().await?;
        }
        (None, Some(path)) => {
            pool.write_to(path)?;
            tracing::info!(path = %path.display(), entries = pool.len(), "identifier pool written");
        }
        (None, None) => {}
    }

    let summary = recorder.summary(pool.len());
    tracing::info!(
        scenario = %plan.scenario,
        elapsed_secs = summary.elapsed_secs,
        pool_size = summary.pool_size,
        failed_checks = summary.failed_checks(),
        "run complete"
    );
    Ok(summary)
}

async fn signing_vu(
    vu: usize,
    deadline: Instant,
    workflow: Arc<SigningWorkflow>,
    tokens: Arc<TokenSource>,
    pool: EntryPool,
    sink: Option<EntrySink>,
    recorder: CheckRecorder,
) -> u64 {
    let mut iterations = 0u64;
    while Instant::now() < deadline {
        let outcome = workflow.run(&tokens).await;
        if let Some(id) = outcome.published.clone() {
            let size = pool.append(id.clone());
            tracing::debug!(vu, uuid = %id, pool_size = size, "published entry");
            if let Some(sink) = &sink {
                sink.publish(id).await;
            }
        }
        let result = if outcome.is_success() {
            IterationOutcome::Completed
        } else {
            IterationOutcome::Failed
        };
        recorder.iteration(Workload::Sign, result);
        iterations += 1;
    }
    tracing::debug!(vu, iterations, "signing VU finished");
    iterations
}

async fn verifying_vu(
    vu: usize,
    deadline: Instant,
    workflow: Arc<VerifyWorkflow>,
    pool: EntryPool,
    recorder: CheckRecorder,
) -> u64 {
    let mut iterations = 0u64;
    while Instant::now() < deadline {
        match workflow.run(&pool).await {
            VerifyOutcome::Idle => {
                recorder.iteration(Workload::Verify, IterationOutcome::Idle);
                tokio::time::sleep(IDLE_BACKOFF).await;
            }
            VerifyOutcome::Verified { passed, .. } => {
                let result = if passed {
                    IterationOutcome::Completed
                } else {
                    IterationOutcome::Failed
                };
                recorder.iteration(Workload::Verify, result);
            }
        }
        iterations += 1;
    }
    tracing::debug!(vu, iterations, "verifying VU finished");
    iterations
}
