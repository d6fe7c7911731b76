//! # tasperf-client: Typed clients for the signing pipeline services
//!
//! Thin, typed access to each external collaborator of the harness:
//! - **OIDC provider**: password-grant token exchange ([`oidc`])
//! - **Crypto helper**: per-attempt signing material and timestamp relay ([`helper`])
//! - **Fulcio**: signing certificate issuance ([`fulcio`])
//! - **Rekor**: entry append and lookup ([`rekor`])
//! - **TSA**: certificate chain ([`tsa`])
//!
//! ## Status Semantics
//!
//! Every operation defines exactly one success status (201 for creations,
//! 200 otherwise). Any other status, including other 2xx codes, surfaces as
//! [`ClientError::UnexpectedStatus`] carrying the status and body.
//!
//! ## No Retry
//!
//! Each call is one attempt. Retrying would distort the latency and error
//! rates the harness exists to measure.

pub mod config;
pub mod error;
pub mod fulcio;
pub mod helper;
pub mod oidc;
pub mod rekor;
pub mod tsa;

pub use config::{ConfigError, OidcCredentials, ServiceConfig};
pub use error::ClientError;

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

/// Top-level client. Holds one sub-client per service, all sharing a single
/// connection pool.
#[derive(Debug, Clone)]
pub struct TasClient {
    oidc: oidc::OidcClient,
    helper: helper::HelperClient,
    fulcio: Option<fulcio::FulcioClient>,
    rekor: rekor::RekorClient,
    tsa: Option<tsa::TsaClient>,
}

impl TasClient {
    /// Create a client from configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            oidc: oidc::OidcClient::new(http.clone()),
            helper: helper::HelperClient::new(http.clone(), config.helper_url),
            fulcio: config
                .fulcio_url
                .map(|url| fulcio::FulcioClient::new(http.clone(), url)),
            rekor: rekor::RekorClient::new(http.clone(), config.rekor_url),
            tsa: config.tsa_url.map(|url| tsa::TsaClient::new(http, url)),
        })
    }

    /// Access the OIDC token client.
    pub fn oidc(&self) -> &oidc::OidcClient {
        &self.oidc
    }

    /// Access the crypto helper client.
    pub fn helper(&self) -> &helper::HelperClient {
        &self.helper
    }

    /// Access the Fulcio client, if a Fulcio URL is configured.
    pub fn fulcio(&self) -> Option<&fulcio::FulcioClient> {
        self.fulcio.as_ref()
    }

    /// Access the Rekor client.
    pub fn rekor(&self) -> &rekor::RekorClient {
        &self.rekor
    }

    /// Access the TSA client, if a TSA URL is configured.
    pub fn tsa(&self) -> Option<&tsa::TsaClient> {
        self.tsa.as_ref()
    }
}

/// Join a base URL and a relative path without doubling or dropping `/`.
pub(crate) fn join(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send `request`, mapping transport failures to [`ClientError::Http`].
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<reqwest::Response, ClientError> {
    tracing::trace!(endpoint, "sending request");
    request.send().await.map_err(|e| ClientError::Http {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

/// Pass the response through if its status is exactly `expected`;
/// otherwise read the body and return [`ClientError::UnexpectedStatus`].
pub(crate) async fn expect_status(
    resp: reqwest::Response,
    expected: StatusCode,
    endpoint: &str,
) -> Result<reqwest::Response, ClientError> {
    if resp.status() == expected {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(endpoint, status, expected = expected.as_u16(), "unexpected status");
    Err(ClientError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

/// Read the full response body as text.
pub(crate) async fn read_text(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<String, ClientError> {
    resp.text().await.map_err(|e| ClientError::Body {
        endpoint: endpoint.to_string(),
        source: e,
    })
}
