//! Client for the local crypto helper.
//!
//! The helper fabricates fresh signing material for every attempt and
//! relays timestamp requests to the TSA on the harness's behalf.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET    | `/generate-payloads[?payload={size}]` | 200, JSON crypto bundle |
//! | POST   | `/get-timestamp` (raw signature bytes) | 200, DER timestamp response |

use tasperf_core::CryptoBundle;

use crate::error::ClientError;

const GENERATE_ENDPOINT: &str = "GET /generate-payloads";
const TIMESTAMP_ENDPOINT: &str = "POST /get-timestamp";

/// Client for the crypto helper service.
#[derive(Debug, Clone)]
pub struct HelperClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HelperClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Fetch one crypto bundle. `payload_size` is passed through as the
    /// `payload` query parameter when set.
    pub async fn generate_payloads(
        &self,
        payload_size: Option<&str>,
    ) -> Result<CryptoBundle, ClientError> {
        let url = crate::join(&self.base_url, "generate-payloads");
        let mut request = self.http.get(url);
        if let Some(size) = payload_size {
            request = request.query(&[("payload", size)]);
        }

        let resp = crate::send(request, GENERATE_ENDPOINT).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::OK, GENERATE_ENDPOINT).await?;
        resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: GENERATE_ENDPOINT.into(),
            detail: e.to_string(),
        })
    }

    /// Request an RFC 3161 timestamp over the raw signature bytes.
    pub async fn get_timestamp(&self, signature: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let url = crate::join(&self.base_url, "get-timestamp");
        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(signature);

        let resp = crate::send(request, TIMESTAMP_ENDPOINT).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::OK, TIMESTAMP_ENDPOINT).await?;
        let bytes = resp.bytes().await.map_err(|e| ClientError::Body {
            endpoint: TIMESTAMP_ENDPOINT.into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}
