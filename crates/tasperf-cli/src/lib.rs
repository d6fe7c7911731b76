//! # tasperf-cli: Command-Line Driver
//!
//! Provides the `tasperf` binary. One subcommand per scenario:
//!
//! ```bash
//! tasperf sign --sign-vus 5 --duration 2m --uuid-out rekor_uuids.txt
//! tasperf sign-verify --sign-vus 10 --verify-vus 40 --duration 10m
//! tasperf verify --verify-vus 40 --uuid-file rekor_uuids.txt
//! ```
//!
//! Service URLs and OIDC credentials come from the environment or from the
//! `services`/`oidc` sections of a `--config` scenario file.

pub mod run;
