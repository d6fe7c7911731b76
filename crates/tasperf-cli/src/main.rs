//! # tasperf CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to the
//! scenario runner.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tasperf_cli::run::{run_scenario, RunArgs};
use tasperf_load::Scenario;

/// Concurrent load harness for a Fulcio/Rekor/TSA signing pipeline.
///
/// Drives signing and verifying virtual users against the services named by
/// REKOR_URL, FULCIO_URL, TSA_URL and HELPER_URL, and reports per-check pass
/// rates and per-step latencies at the end of the run.
#[derive(Parser, Debug)]
#[command(name = "tasperf", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML scenario file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Signing VUs only, including the timestamp branch.
    Sign(RunArgs),

    /// Signing and verifying VUs sharing a live pool of entries.
    SignVerify(RunArgs),

    /// Verifying VUs sampling a file of existing entry identifiers.
    Verify(RunArgs),
}

impl Commands {
    fn split(self) -> (Scenario, RunArgs) {
        match self {
            Self::Sign(args) => (Scenario::Sign, args),
            Self::SignVerify(args) => (Scenario::SignVerify, args),
            Self::Verify(args) => (Scenario::Verify, args),
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let (scenario, args) = cli.command.split();
    tracing::debug!(%scenario, "tasperf starting");

    match run_scenario(scenario, &args, cli.config.as_deref()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
