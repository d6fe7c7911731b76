//! Client error types.

/// Errors from calls to the services under test.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error before a status line arrived (connect, timeout).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The expected status arrived but the body could not be read.
    #[error("failed to read response body from {endpoint}: {source}")]
    Body {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service answered with a status other than the one the protocol
    /// defines as success.
    #[error("{endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body could not be decoded.
    #[error("failed to deserialize response from {endpoint}: {detail}")]
    Deserialization { endpoint: String, detail: String },
    /// Configuration error, raised before any network call.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ClientError {
    /// HTTP status carried by the error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service answered with the success status before the
    /// call failed. Such failures concern the payload, not the status.
    pub fn reached_expected_status(&self) -> bool {
        matches!(self, Self::Body { .. } | Self::Deserialization { .. })
    }
}
