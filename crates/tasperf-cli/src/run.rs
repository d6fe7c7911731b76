//! # Scenario Subcommands
//!
//! `tasperf sign`, `tasperf sign-verify` and `tasperf verify` share one
//! argument set. Flags override the scenario file, which overrides the
//! environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tasperf_client::{OidcCredentials, TasClient};
use tasperf_core::{CheckRecorder, RunSummary};
use tasperf_load::scenario::{parse_duration, Scenario, ScenarioConfig, ScenarioFile};
use tasperf_load::{RunPlan, TokenMode};

/// Arguments shared by every scenario subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Number of signing VUs.
    #[arg(long)]
    pub sign_vus: Option<usize>,

    /// Number of verifying VUs.
    #[arg(long)]
    pub verify_vus: Option<usize>,

    /// Run duration for both pools, e.g. "10m" or "90s".
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Signing pool duration, if different.
    #[arg(long, value_parser = parse_duration)]
    pub sign_duration: Option<Duration>,

    /// Verification pool duration, if different.
    #[arg(long, value_parser = parse_duration)]
    pub verify_duration: Option<Duration>,

    /// Payload selector passed to the crypto helper.
    #[arg(long)]
    pub payload_size: Option<String>,

    /// Identifier file sampled by the verify scenario.
    #[arg(long)]
    pub uuid_file: Option<PathBuf>,

    /// Append published identifiers to this file. `verify` writes the
    /// identifiers it sampled.
    #[arg(long)]
    pub uuid_out: Option<PathBuf>,

    /// When signing VUs exchange credentials for a token.
    #[arg(long, value_enum)]
    pub token_mode: Option<TokenModeArg>,

    /// Skip the RFC 3161 timestamp branch of the signing workflow.
    #[arg(long)]
    pub no_timestamp: bool,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    pub summary_out: Option<PathBuf>,

    /// Serve Prometheus metrics on this address while the run is active.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenModeArg {
    /// Fetch one token before the workload starts.
    Once,
    /// Fetch a token at the start of every signing iteration.
    PerIteration,
}

impl From<TokenModeArg> for TokenMode {
    fn from(arg: TokenModeArg) -> Self {
        match arg {
            TokenModeArg::Once => TokenMode::Once,
            TokenModeArg::PerIteration => TokenMode::PerIteration,
        }
    }
}

impl RunArgs {
    /// Overlay explicitly given flags onto `cfg`.
    pub fn apply(&self, cfg: &mut ScenarioConfig) {
        if let Some(n) = self.sign_vus {
            cfg.sign_vus = n;
        }
        if let Some(n) = self.verify_vus {
            cfg.verify_vus = n;
        }
        if let Some(d) = self.duration {
            cfg.duration = d;
        }
        if self.sign_duration.is_some() {
            cfg.sign_duration = self.sign_duration;
        }
        if self.verify_duration.is_some() {
            cfg.verify_duration = self.verify_duration;
        }
        if let Some(size) = &self.payload_size {
            cfg.payload_size = Some(size.clone());
        }
        if let Some(path) = &self.uuid_file {
            cfg.uuid_file = path.clone();
        }
        if let Some(path) = &self.uuid_out {
            cfg.uuid_out = Some(path.clone());
        }
        if let Some(mode) = self.token_mode {
            cfg.token_mode = Some(mode.into());
        }
        if self.no_timestamp {
            cfg.timestamp_branch = Some(false);
        }
    }
}

/// Execute one scenario end to end. Returns the process exit code.
///
/// Setup failures surface as `Err`. A run that completes returns `0` even
/// when checks failed; the summary reports them.
pub async fn run_scenario(scenario: Scenario, args: &RunArgs, config: Option<&Path>) -> Result<u8> {
    let file = match config {
        Some(path) => ScenarioFile::load(path)?,
        None => ScenarioFile::default(),
    };

    let mut cfg = file.scenario_config()?;
    args.apply(&mut cfg);
    let plan = RunPlan::new(scenario, &cfg)?;
    tracing::debug!(?plan, "resolved run plan");

    let services = file.service_config()?;
    let client = TasClient::new(services).context("failed to build HTTP client")?;
    let creds = if scenario.signs() {
        file.credentials()
    } else {
        OidcCredentials::default()
    };

    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .with_context(|| format!("failed to start metrics listener on {addr}"))?;
        tracing::info!(%addr, "serving Prometheus metrics");
    }

    let recorder = CheckRecorder::new(scenario.as_str());
    let summary = tasperf_load::run(plan, client, creds, recorder).await?;

    println!("{summary}");
    if let Some(path) = &args.summary_out {
        write_summary(&summary, path)?;
    }
    if summary.failed_checks() > 0 {
        tracing::warn!(failed = summary.failed_checks(), "run completed with failed checks");
    }
    Ok(0)
}

/// Write `summary` as pretty-printed JSON.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "summary written");
    Ok(())
}
