//! Client for the Rekor transparency log.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST   | `/api/v1/log/entries` | 201, `Location` names the new entry |
//! | GET    | `/api/v1/log/entries/{uuid}` | 200, JSON map keyed by uuid |

use serde::{Deserialize, Serialize};
use tasperf_core::EntryUuid;

use crate::config::ConfigError;
use crate::error::ClientError;

const CREATE_ENDPOINT: &str = "POST /api/v1/log/entries";

/// Entry API version accepted by both supported kinds.
pub const ENTRY_API_VERSION: &str = "0.0.1";

// -- Proposed entry types ------------------------------------------------------

/// A log entry submission: `{apiVersion, kind, spec}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedEntry {
    api_version: &'static str,
    kind: &'static str,
    spec: EntrySpec,
}

impl ProposedEntry {
    /// A `hashedrekord` entry: an artifact signature, the certificate that
    /// verifies it (base64 of the PEM), and the artifact's SHA-256.
    pub fn hashed_rekord(
        signature_b64: impl Into<String>,
        certificate_pem_b64: impl Into<String>,
        sha256_hex: impl Into<String>,
    ) -> Self {
        Self {
            api_version: ENTRY_API_VERSION,
            kind: "hashedrekord",
            spec: EntrySpec::HashedRekord(HashedRekordSpec {
                signature: SignatureSpec {
                    content: signature_b64.into(),
                    public_key: ContentField {
                        content: certificate_pem_b64.into(),
                    },
                },
                data: DataSpec {
                    hash: HashSpec {
                        algorithm: "sha256".into(),
                        value: sha256_hex.into(),
                    },
                },
            }),
        }
    }

    /// An `rfc3161` entry carrying a base64 timestamp response.
    pub fn rfc3161(tsr_b64: impl Into<String>) -> Self {
        Self {
            api_version: ENTRY_API_VERSION,
            kind: "rfc3161",
            spec: EntrySpec::Rfc3161(Rfc3161Spec {
                tsr: ContentField {
                    content: tsr_b64.into(),
                },
            }),
        }
    }

    /// Entry kind, e.g. `hashedrekord`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum EntrySpec {
    HashedRekord(HashedRekordSpec),
    Rfc3161(Rfc3161Spec),
}

#[derive(Debug, Clone, Serialize)]
struct HashedRekordSpec {
    signature: SignatureSpec,
    data: DataSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureSpec {
    content: String,
    public_key: ContentField,
}

#[derive(Debug, Clone, Serialize)]
struct DataSpec {
    hash: HashSpec,
}

#[derive(Debug, Clone, Serialize)]
struct HashSpec {
    algorithm: String,
    value: String,
}

#[derive(Debug, Clone, Serialize)]
struct Rfc3161Spec {
    tsr: ContentField,
}

#[derive(Debug, Clone, Serialize)]
struct ContentField {
    content: String,
}

// -- Response types -----------------------------------------------------------

/// Outcome of a 201 append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntry {
    /// Raw `Location` header, if the log sent one.
    pub location: Option<String>,
}

impl CreatedEntry {
    /// Identifier parsed from the final path segment of `Location`.
    pub fn uuid(&self) -> Option<EntryUuid> {
        self.location.as_deref().and_then(EntryUuid::from_location)
    }
}

/// One log entry as returned under its uuid key by `GET /entries/{uuid}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Canonicalized entry, base64 encoded.
    pub body: String,
    #[serde(default)]
    pub integrated_time: Option<i64>,
    #[serde(default, rename = "logID")]
    pub log_id: Option<String>,
    #[serde(default)]
    pub log_index: Option<i64>,
}

// -- Client -------------------------------------------------------------------

/// Client for the Rekor API.
#[derive(Debug, Clone)]
pub struct RekorClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl RekorClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Append an entry. Success is exactly 201.
    pub async fn create_entry(&self, entry: &ProposedEntry) -> Result<CreatedEntry, ClientError> {
        let url = crate::join(&self.base_url, "api/v1/log/entries");
        let resp = crate::send(self.http.post(url).json(entry), CREATE_ENDPOINT).await?;
        let resp =
            crate::expect_status(resp, reqwest::StatusCode::CREATED, CREATE_ENDPOINT).await?;

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(CreatedEntry { location })
    }

    /// Fetch an entry by uuid. Returns the raw 200 body; structural
    /// validation is left to the caller.
    pub async fn get_entry(&self, uuid: &EntryUuid) -> Result<String, ClientError> {
        let endpoint = format!("GET /api/v1/log/entries/{uuid}");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::Invalid("REKOR_URL", self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "log", "entries", uuid.as_str()]);
        let resp = crate::send(self.http.get(url), &endpoint).await?;
        let resp = crate::expect_status(resp, reqwest::StatusCode::OK, &endpoint).await?;
        crate::read_text(resp, &endpoint).await
    }
}
