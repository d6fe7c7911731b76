//! OIDC token lifecycle.
//!
//! For sustained load the token is fetched exactly once during setup and
//! shared read-only ([`TokenSource::Shared`]); repeated exchanges would make
//! the identity provider the bottleneck. Small smoke runs may instead fetch
//! a token on every iteration ([`TokenSource::PerIteration`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tasperf_client::{ClientError, OidcCredentials, TasClient};
use tasperf_core::{BearerToken, HarnessError};

/// When signing VUs obtain their bearer token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenMode {
    /// One exchange during setup, shared by every VU.
    #[default]
    Once,
    /// One exchange per signing iteration.
    PerIteration,
}

/// Where a signing iteration gets its token from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Published once before the workload phase; never refreshed.
    Shared(Arc<BearerToken>),
    /// Fetched at the start of every iteration.
    PerIteration(OidcCredentials),
}

impl TokenSource {
    /// Prepare the token source for a run.
    ///
    /// In [`TokenMode::Once`] this performs the single token exchange;
    /// any failure is fatal to the run. In [`TokenMode::PerIteration`] the
    /// credentials are only validated.
    pub async fn prepare(
        client: &TasClient,
        creds: OidcCredentials,
        mode: TokenMode,
    ) -> Result<Self, HarnessError> {
        match mode {
            TokenMode::Once => {
                tracing::info!("fetching a single OIDC token for the entire run");
                let token = fetch_token(client, &creds).await?;
                tracing::info!("OIDC token retrieved; starting VU iterations");
                Ok(Self::Shared(Arc::new(token)))
            }
            TokenMode::PerIteration => {
                creds
                    .validate()
                    .map_err(|e| HarnessError::Configuration(e.to_string()))?;
                Ok(Self::PerIteration(creds))
            }
        }
    }

    /// Token for one signing iteration.
    pub async fn token(&self, client: &TasClient) -> Result<Arc<BearerToken>, HarnessError> {
        match self {
            Self::Shared(token) => Ok(Arc::clone(token)),
            Self::PerIteration(creds) => fetch_token(client, creds).await.map(Arc::new),
        }
    }
}

/// Perform one token exchange, classifying failures.
pub async fn fetch_token(
    client: &TasClient,
    creds: &OidcCredentials,
) -> Result<BearerToken, HarnessError> {
    client
        .oidc()
        .fetch_token(creds)
        .await
        .map_err(|e| match e {
            ClientError::Config(c) => HarnessError::Configuration(c.to_string()),
            ClientError::UnexpectedStatus { status, body, .. } => {
                tracing::error!(status, body = %body, "OIDC token request failed");
                HarnessError::Authentication { status, body }
            }
            ClientError::Deserialization { detail, .. } => HarnessError::Authentication {
                status: 200,
                body: detail,
            },
            other => HarnessError::Dependency {
                service: "oidc",
                detail: other.to_string(),
            },
        })
}
