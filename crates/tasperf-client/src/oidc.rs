//! OIDC password-grant token exchange.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST   | `{issuer}/protocol/openid-connect/token` | 200, JSON `access_token` |

use serde::Deserialize;
use tasperf_core::BearerToken;

use crate::config::OidcCredentials;
use crate::error::ClientError;

const ENDPOINT: &str = "POST /protocol/openid-connect/token";

/// Subset of the token endpoint response the harness uses.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client for the identity provider's token endpoint.
#[derive(Debug, Clone)]
pub struct OidcClient {
    http: reqwest::Client,
}

impl OidcClient {
    pub(crate) fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Exchange user credentials for an access token.
    ///
    /// Credentials are validated before any request is sent; a missing field
    /// yields [`ClientError::Config`]. A non-200 answer yields
    /// [`ClientError::UnexpectedStatus`]. A 200 without `access_token` yields
    /// [`ClientError::Deserialization`].
    pub async fn fetch_token(&self, creds: &OidcCredentials) -> Result<BearerToken, ClientError> {
        creds.validate()?;

        let form = [
            ("username", creds.user.as_str()),
            ("password", creds.password.as_str()),
            ("scope", "openid"),
            ("client_id", creds.client_id.as_str()),
            ("grant_type", "password"),
        ];
        let resp = crate::send(self.http.post(creds.token_url()).form(&form), ENDPOINT).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::OK, ENDPOINT).await?;

        let parsed: TokenResponse =
            resp.json().await.map_err(|e| ClientError::Deserialization {
                endpoint: ENDPOINT.into(),
                detail: e.to_string(),
            })?;

        parsed
            .access_token
            .and_then(BearerToken::new)
            .ok_or_else(|| ClientError::Deserialization {
                endpoint: ENDPOINT.into(),
                detail: "response has no access_token".into(),
            })
    }
}
