//! Client for the timestamp authority.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET    | `/certchain` | 200 |

use crate::error::ClientError;

const ENDPOINT: &str = "GET /certchain";

/// Client for the TSA API.
#[derive(Debug, Clone)]
pub struct TsaClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl TsaClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Fetch the TSA certificate chain. The body is returned unvalidated.
    pub async fn cert_chain(&self) -> Result<String, ClientError> {
        let url = crate::join(&self.base_url, "certchain");
        let resp = crate::send(self.http.get(url), ENDPOINT).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::OK, ENDPOINT).await?;
        crate::read_text(resp, ENDPOINT).await
    }
}
