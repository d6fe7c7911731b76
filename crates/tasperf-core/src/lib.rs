//! # tasperf-core: Foundational Types for the tasperf Load Harness
//!
//! Leaf crate of the workspace. Defines the domain primitives shared by the
//! HTTP clients (`tasperf-client`), the workflows and scheduler
//! (`tasperf-load`), and the binary (`tasperf-cli`).
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `EntryUuid` and `BearerToken` are
//!    newtypes with validated constructors. An `EntryUuid` is never empty.
//!
//! 2. **One shared, append-only pool.** [`EntryPool`] is the only state
//!    mutated by one workload and read by another. Appends are atomic with
//!    respect to random-index reads; the lock is never held across `.await`.
//!
//! 3. **Checks, not panics.** Structural response validation is recorded as
//!    pass/fail observations on a [`CheckRecorder`]; nothing in a workflow
//!    iteration escapes as a panic.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tasperf-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod bundle;
pub mod checks;
pub mod error;
pub mod identity;
pub mod pem;
pub mod pool;

pub use bundle::CryptoBundle;
pub use checks::{
    CheckRecorder, CheckTally, IterationOutcome, IterationTally, RunSummary, StepStats, Workload,
};
pub use error::{HarnessError, PoolError};
pub use identity::{BearerToken, EntryUuid};
pub use pem::extract_certificate;
pub use pool::EntryPool;
