//! # tasperf-load: Workflows and the Dual-Workload Scheduler
//!
//! Drives two independently sized pools of virtual users (VUs) against the
//! signing pipeline:
//!
//! - **Signing VUs** run [`sign::SigningWorkflow`]: crypto material →
//!   certificate → `hashedrekord` append, plus the optional timestamp branch.
//!   Every identifier a successful append yields is published to the shared
//!   [`EntryPool`](tasperf_core::EntryPool).
//! - **Verifying VUs** run [`verify::VerifyWorkflow`]: sample the pool →
//!   fetch and structurally validate the entry → fetch the TSA chain.
//!
//! The pools share nothing but the entry pool. The OIDC token is fetched
//! once, before any signing VU starts, and handed to every VU read-only.
//!
//! ## Failure Scope
//!
//! Configuration and authentication failures abort the run before the
//! workload loop starts ([`scheduler::run`] returns `Err`). Everything else
//! is caught at a stage boundary, recorded as a failed check, and ends only
//! the current iteration.

pub mod scenario;
pub mod scheduler;
pub mod sign;
pub mod sink;
pub mod token;
pub mod verify;

pub use scenario::{Scenario, ScenarioConfig, ScenarioFile};
pub use scheduler::{run, RunPlan, WorkloadSpec};
pub use sign::{SignOutcome, SignStage, SigningWorkflow};
pub use sink::EntrySink;
pub use token::{TokenMode, TokenSource};
pub use verify::{validate_entry, EntryValidation, VerifyOutcome, VerifyWorkflow};

use std::future::Future;
use std::time::Instant;

use tasperf_core::CheckRecorder;

/// Await `fut` and record its wall-clock duration under `step`.
pub(crate) async fn timed<T>(recorder: &CheckRecorder, step: &str, fut: impl Future<Output = T>) -> T {
    let start = Instant::now();
    let out = fut.await;
    recorder.observe(step, start.elapsed());
    out
}

/// Log a failed HTTP step with its status and body.
pub(crate) fn log_failure(step: &str, err: &tasperf_client::ClientError) {
    match err.status() {
        Some(status) => tracing::error!(step, status, error = %err, "request failed"),
        None => tracing::error!(step, error = %err, "request failed"),
    }
}
