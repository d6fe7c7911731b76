//! # Error Types: Harness Failure Taxonomy
//!
//! Every failure the harness can observe falls into one of four classes.
//! The class decides how far the failure propagates:
//!
//! | Class | Scope |
//! |---|---|
//! | `Configuration` | aborts the run (or one VU's setup) before any network call |
//! | `Authentication` | aborts the run before the workload loop starts |
//! | `Dependency` | aborts the current iteration; during setup, the run |
//! | `Validation` | recorded as a failed check; never aborts anything |
//!
//! An empty identifier source is not an error at all: the verifying VU
//! performs a no-op iteration.

use thiserror::Error;

/// Top-level error type for the harness.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The identity provider rejected the token exchange.
    #[error("authentication failed: HTTP {status}: {body}")]
    Authentication {
        /// HTTP status returned by the identity provider.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// A downstream service (helper, cert authority, log, TSA) failed.
    #[error("{service} failed: {detail}")]
    Dependency {
        /// Logical service name, e.g. `fulcio`.
        service: &'static str,
        /// Status and body, or the transport error.
        detail: String,
    },

    /// A response did not have the expected structure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Identifier file could not be read or written.
    #[error("entry pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Errors from loading or persisting an identifier file.
#[derive(Error, Debug)]
pub enum PoolError {
    /// Reading or writing the file failed.
    #[error("identifier file {path}: {source}")]
    Io {
        /// File path as given by the caller.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
