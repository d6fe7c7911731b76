//! # Verification Workflow
//!
//! Sample one identifier, fetch its log entry, and validate the response
//! structurally:
//!
//! - the JSON object has a key equal to the queried identifier,
//! - that value's `body` base64-decodes to JSON,
//! - the decoded entry has a truthy `spec.signature`.
//!
//! Optionally also fetches the TSA certificate chain. Nothing here is a
//! cryptographic verification; it only checks that the log answers with
//! plausibly shaped entries under concurrent write load.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};
use tasperf_client::rekor::LogEntry;
use tasperf_client::TasClient;
use tasperf_core::{CheckRecorder, EntryPool, EntryUuid};

use crate::{log_failure, timed};

pub mod checks {
    pub const REKOR_GET_OK: &str = "Rekor GET returned HTTP 200";
    pub const CONTAINS_UUID: &str = "Rekor response contains the correct entry UUID";
    pub const HAS_SIGNATURE: &str = "Rekor entry body contains a signature block";
    pub const INVALID_JSON: &str = "Rekor response body was not valid JSON";
    pub const TSA_CHAIN_OK: &str = "TSA GET certchain returned HTTP 200";
}

pub mod steps {
    pub const REKOR_GET: &str = "Rekor_GetEntryByUUID";
    pub const TSA_CHAIN: &str = "TSA_GetCertChain";
}

/// Structural findings for one fetched entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryValidation {
    /// The response object is keyed by the queried identifier.
    pub contains_uuid: bool,
    /// The entry's `body` decoded to JSON.
    pub body_decoded: bool,
    /// The decoded entry carries `spec.signature`. Only meaningful when
    /// `body_decoded` is set.
    pub has_signature: bool,
}

impl EntryValidation {
    pub fn passed(&self) -> bool {
        self.contains_uuid && self.body_decoded && self.has_signature
    }
}

/// Validate a raw `GET /entries/{uuid}` response body.
///
/// Never fails: every decode or parse problem is reported as a `false`
/// field.
pub fn validate_entry(uuid: &EntryUuid, raw: &str) -> EntryValidation {
    let parsed: Option<Map<String, Value>> = serde_json::from_str(raw).ok();
    let entry = parsed.as_ref().and_then(|m| m.get(uuid.as_str()));

    let decoded = entry
        .and_then(|e| LogEntry::deserialize(e).ok())
        .and_then(|e| STANDARD.decode(e.body).ok())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());

    EntryValidation {
        contains_uuid: entry.is_some(),
        body_decoded: decoded.is_some(),
        has_signature: decoded
            .as_ref()
            .and_then(|d| d.pointer("/spec/signature"))
            .is_some_and(is_truthy),
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Result of one verification iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The identifier source was empty; no request was made.
    Idle,
    /// An identifier was sampled and checked.
    Verified { uuid: EntryUuid, passed: bool },
}

/// Drives verification iterations for one run. Shared by all verifying VUs.
#[derive(Debug, Clone)]
pub struct VerifyWorkflow {
    client: TasClient,
    recorder: CheckRecorder,
    fetch_cert_chain: bool,
}

impl VerifyWorkflow {
    /// `fetch_cert_chain` adds the TSA certificate chain request to every
    /// iteration; it is ignored when no TSA URL is configured.
    pub fn new(client: TasClient, recorder: CheckRecorder, fetch_cert_chain: bool) -> Self {
        let fetch_cert_chain = fetch_cert_chain && client.tsa().is_some();
        Self {
            client,
            recorder,
            fetch_cert_chain,
        }
    }

    /// Run one iteration against a uniformly random identifier from `pool`.
    pub async fn run(&self, pool: &EntryPool) -> VerifyOutcome {
        let Some(uuid) = pool.sample_random() else {
            tracing::trace!("identifier source is empty, skipping iteration");
            return VerifyOutcome::Idle;
        };
        let passed = self.verify(&uuid).await;
        VerifyOutcome::Verified { uuid, passed }
    }

    /// Verify one identifier. Returns whether every check passed.
    pub async fn verify(&self, uuid: &EntryUuid) -> bool {
        let mut passed = self.fetch_entry(uuid).await;
        if self.fetch_cert_chain {
            passed &= self.fetch_cert_chain().await;
        }
        passed
    }

    async fn fetch_entry(&self, uuid: &EntryUuid) -> bool {
        let result = timed(&self.recorder, steps::REKOR_GET, self.client.rekor().get_entry(uuid)).await;
        let raw = match result {
            Ok(raw) => {
                self.recorder.check(checks::REKOR_GET_OK, true);
                raw
            }
            Err(e) => {
                if self.recorder.check(checks::REKOR_GET_OK, e.reached_expected_status()) {
                    self.recorder.check(checks::INVALID_JSON, false);
                }
                log_failure(steps::REKOR_GET, &e);
                return false;
            }
        };

        let v = validate_entry(uuid, &raw);
        self.recorder.check(checks::CONTAINS_UUID, v.contains_uuid);
        if v.body_decoded {
            self.recorder.check(checks::HAS_SIGNATURE, v.has_signature);
        } else {
            self.recorder.check(checks::INVALID_JSON, false);
            tracing::warn!(%uuid, "log entry body could not be decoded");
        }
        v.passed()
    }

    async fn fetch_cert_chain(&self) -> bool {
        let Some(tsa) = self.client.tsa() else {
            return true;
        };
        let result = timed(&self.recorder, steps::TSA_CHAIN, tsa.cert_chain()).await;
        if let Err(e) = &result {
            log_failure(steps::TSA_CHAIN, e);
        }
        self.recorder.check(checks::TSA_CHAIN_OK, result.is_ok())
    }
}
