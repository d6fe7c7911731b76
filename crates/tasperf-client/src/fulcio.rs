//! Client for the Fulcio certificate authority.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST   | `/api/v1/signingCert` (bearer auth) | 201, body embeds PEM chain |

use serde::Serialize;
use tasperf_core::{BearerToken, CryptoBundle};

use crate::error::ClientError;

const ENDPOINT: &str = "POST /api/v1/signingCert";

/// `publicKey` member of a certificate request.
#[derive(Debug, Serialize)]
pub struct PublicKeyContent<'a> {
    pub content: &'a str,
}

/// Certificate request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningCertRequest<'a> {
    pub public_key: PublicKeyContent<'a>,
    pub signed_email_address: &'a str,
}

impl<'a> SigningCertRequest<'a> {
    /// Build a request from the helper's bundle.
    pub fn from_bundle(bundle: &'a CryptoBundle) -> Self {
        Self {
            public_key: PublicKeyContent {
                content: &bundle.public_key_base64,
            },
            signed_email_address: &bundle.signed_email_address,
        }
    }
}

/// Client for the Fulcio API.
#[derive(Debug, Clone)]
pub struct FulcioClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl FulcioClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Request a signing certificate. Returns the raw 201 body; PEM
    /// extraction is left to the caller.
    pub async fn request_certificate(
        &self,
        token: &BearerToken,
        req: &SigningCertRequest<'_>,
    ) -> Result<String, ClientError> {
        let url = crate::join(&self.base_url, "api/v1/signingCert");
        let request = self.http.post(url).bearer_auth(token.expose()).json(req);

        let resp = crate::send(request, ENDPOINT).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::CREATED, ENDPOINT).await?;
        crate::read_text(resp, ENDPOINT).await
    }
}
