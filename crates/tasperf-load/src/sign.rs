//! # Signing Workflow
//!
//! One signing iteration is a short state machine. Each stage runs only if
//! its predecessor succeeded:
//!
//! 1. `CryptoMaterial`: fetch a fresh bundle from the helper. Failure ends
//!    the iteration.
//! 2. `Certificate`: request a signing certificate (exactly 201) and extract
//!    the first PEM block from the body.
//! 3. `HashedEntry`: append a `hashedrekord` entry (exactly 201) embedding
//!    the base64 of that PEM; the `Location` header names the new entry.
//!
//! When the timestamp branch is enabled, a second, independent branch runs
//! in the same iteration, gated only on the bundle carrying an artifact
//! signature:
//!
//! 4. `Timestamp`: relay the raw signature bytes to the TSA helper (exactly
//!    200).
//! 5. `TimestampEntry`: append an `rfc3161` entry (exactly 201).
//!
//! No stage is retried.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tasperf_client::fulcio::SigningCertRequest;
use tasperf_client::rekor::ProposedEntry;
use tasperf_client::TasClient;
use tasperf_core::{extract_certificate, BearerToken, CheckRecorder, CryptoBundle, EntryUuid, HarnessError};

use crate::token::TokenSource;
use crate::{log_failure, timed};

/// Check names, as they appear in the run summary.
pub mod checks {
    pub const HELPER_OK: &str = "Helper returned HTTP 200";
    pub const HELPER_PAYLOAD: &str = "Helper payload is valid JSON";
    pub const FULCIO_CREATED: &str = "Fulcio returned HTTP 201";
    pub const FULCIO_HAS_CERT: &str = "Fulcio response contains a certificate";
    pub const FULCIO_BODY: &str = "Fulcio response body was readable";
    pub const HASHED_CREATED: &str = "Rekor (hashedrekord) returned HTTP 201";
    pub const HASHED_LOCATION: &str = "Rekor (hashedrekord) response has a Location header";
    pub const SIGNATURE_PRESENT: &str = "Helper supplied an artifact signature";
    pub const SIGNATURE_DECODES: &str = "Artifact signature is valid base64";
    pub const TSA_OK: &str = "TSA Helper returned HTTP 200";
    pub const TSA_BODY: &str = "TSA Helper response body was readable";
    pub const RFC3161_CREATED: &str = "Rekor (rfc3161) returned HTTP 201";
}

/// Step names used for latency aggregation.
pub mod steps {
    pub const OIDC_TOKEN: &str = "OIDC_GetToken";
    pub const HELPER: &str = "Helper_GetCrypto";
    pub const FULCIO: &str = "Fulcio_RequestCert";
    pub const HASHED: &str = "Rekor_CreateHashedRekord";
    pub const TSA: &str = "TSA_GetTimestamp";
    pub const RFC3161: &str = "Rekor_CreateRfc3161";
}

/// Stages of a signing iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignStage {
    Token,
    CryptoMaterial,
    Certificate,
    HashedEntry,
    Timestamp,
    TimestampEntry,
}

/// Result of one signing iteration, consumed by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutcome {
    /// Identifier to publish, if the hashed entry append produced one.
    pub published: Option<EntryUuid>,
    /// First stage of the main chain that failed.
    pub failed_stage: Option<SignStage>,
    /// `None` when the timestamp branch did not run.
    pub timestamp_entry: Option<bool>,
}

impl SignOutcome {
    /// Whether every attempted stage succeeded.
    pub fn is_success(&self) -> bool {
        self.failed_stage.is_none() && self.timestamp_entry != Some(false)
    }

    fn failed(stage: SignStage) -> Self {
        Self {
            failed_stage: Some(stage),
            ..Self::default()
        }
    }
}

/// Drives signing iterations for one run. Shared by all signing VUs.
#[derive(Debug, Clone)]
pub struct SigningWorkflow {
    client: TasClient,
    recorder: CheckRecorder,
    payload_size: Option<String>,
    timestamp_branch: bool,
}

impl SigningWorkflow {
    /// Fails with `Configuration` if no Fulcio URL is configured.
    pub fn new(
        client: TasClient,
        recorder: CheckRecorder,
        payload_size: Option<String>,
        timestamp_branch: bool,
    ) -> Result<Self, HarnessError> {
        if client.fulcio().is_none() {
            return Err(HarnessError::Configuration(
                "FULCIO_URL is required for signing workloads".into(),
            ));
        }
        Ok(Self {
            client,
            recorder,
            payload_size,
            timestamp_branch,
        })
    }

    /// Run one iteration.
    pub async fn run(&self, tokens: &TokenSource) -> SignOutcome {
        let token = match tokens {
            TokenSource::Shared(token) => Ok(Arc::clone(token)),
            TokenSource::PerIteration(_) => {
                timed(&self.recorder, steps::OIDC_TOKEN, tokens.token(&self.client)).await
            }
        };
        let token = match token {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "failed to retrieve OIDC token for iteration");
                return SignOutcome::failed(SignStage::Token);
            }
        };

        let bundle = match self.obtain_crypto_material().await {
            Some(bundle) => bundle,
            None => return SignOutcome::failed(SignStage::CryptoMaterial),
        };

        let mut outcome = self.hashed_rekord_branch(&token, &bundle).await;
        if self.timestamp_branch {
            let result = self.run_timestamp_branch(&bundle).await;
            if let Err(stage) = result {
                tracing::debug!(?stage, "timestamp branch failed");
            }
            outcome.timestamp_entry = Some(result.is_ok());
        }
        outcome
    }

    async fn obtain_crypto_material(&self) -> Option<CryptoBundle> {
        let result = timed(
            &self.recorder,
            steps::HELPER,
            self.client.helper().generate_payloads(self.payload_size.as_deref()),
        )
        .await;
        match result {
            Ok(bundle) => {
                self.recorder.check(checks::HELPER_OK, true);
                Some(bundle)
            }
            Err(e) => {
                if self.recorder.check(checks::HELPER_OK, e.reached_expected_status()) {
                    self.recorder.check(checks::HELPER_PAYLOAD, false);
                }
                log_failure(steps::HELPER, &e);
                None
            }
        }
    }

    async fn hashed_rekord_branch(&self, token: &BearerToken, bundle: &CryptoBundle) -> SignOutcome {
        let certificate = match self.request_certificate(token, bundle).await {
            Some(pem) => pem,
            None => {
                tracing::error!("failed to get certificate from Fulcio, cannot proceed");
                return SignOutcome::failed(SignStage::Certificate);
            }
        };

        let entry = ProposedEntry::hashed_rekord(
            bundle.artifact_signature.clone(),
            STANDARD.encode(certificate.as_bytes()),
            bundle.artifact_hash.clone(),
        );
        let result = timed(&self.recorder, steps::HASHED, self.client.rekor().create_entry(&entry)).await;
        match result {
            Ok(created) => {
                self.recorder.check(checks::HASHED_CREATED, true);
                let published = created.uuid();
                if self.recorder.check(checks::HASHED_LOCATION, published.is_some()) {
                    tracing::debug!(uuid = ?published, "hashedrekord entry created");
                } else {
                    tracing::warn!(
                        location = ?created.location,
                        "hashedrekord entry created without a usable Location header"
                    );
                }
                SignOutcome {
                    published,
                    ..SignOutcome::default()
                }
            }
            Err(e) => {
                self.recorder.check(checks::HASHED_CREATED, false);
                log_failure(steps::HASHED, &e);
                SignOutcome::failed(SignStage::HashedEntry)
            }
        }
    }

    async fn request_certificate(&self, token: &BearerToken, bundle: &CryptoBundle) -> Option<String> {
        let fulcio = self.client.fulcio()?;
        let req = SigningCertRequest::from_bundle(bundle);
        let result = timed(&self.recorder, steps::FULCIO, fulcio.request_certificate(token, &req)).await;
        let body = match result {
            Ok(body) => {
                self.recorder.check(checks::FULCIO_CREATED, true);
                body
            }
            Err(e) => {
                if self.recorder.check(checks::FULCIO_CREATED, e.reached_expected_status()) {
                    self.recorder.check(checks::FULCIO_BODY, false);
                }
                log_failure(steps::FULCIO, &e);
                return None;
            }
        };
        let pem = extract_certificate(&body).map(str::to_string);
        if !self.recorder.check(checks::FULCIO_HAS_CERT, pem.is_some()) {
            tracing::error!(body = %body, "Fulcio response contains no PEM certificate block");
        }
        pem
    }

    async fn run_timestamp_branch(&self, bundle: &CryptoBundle) -> Result<(), SignStage> {
        let signature_b64 = match bundle.artifact_signature() {
            Some(sig) => {
                self.recorder.check(checks::SIGNATURE_PRESENT, true);
                sig
            }
            None => {
                self.recorder.check(checks::SIGNATURE_PRESENT, false);
                tracing::error!("failed to get artifact signature, cannot proceed to TSA workflow");
                return Err(SignStage::Timestamp);
            }
        };
        let signature = match STANDARD.decode(signature_b64) {
            Ok(bytes) => {
                self.recorder.check(checks::SIGNATURE_DECODES, true);
                bytes
            }
            Err(e) => {
                self.recorder.check(checks::SIGNATURE_DECODES, false);
                let err = HarnessError::Validation(format!("artifact signature: {e}"));
                tracing::error!(error = %err, "cannot proceed to TSA workflow");
                return Err(SignStage::Timestamp);
            }
        };

        let tsr = match timed(&self.recorder, steps::TSA, self.client.helper().get_timestamp(signature)).await {
            Ok(tsr) => {
                self.recorder.check(checks::TSA_OK, true);
                tsr
            }
            Err(e) => {
                if self.recorder.check(checks::TSA_OK, e.reached_expected_status()) {
                    self.recorder.check(checks::TSA_BODY, false);
                }
                log_failure(steps::TSA, &e);
                return Err(SignStage::Timestamp);
            }
        };

        let entry = ProposedEntry::rfc3161(STANDARD.encode(&tsr));
        let result = timed(&self.recorder, steps::RFC3161, self.client.rekor().create_entry(&entry)).await;
        let created = self.recorder.check(checks::RFC3161_CREATED, result.is_ok());
        if let Err(e) = result {
            log_failure(steps::RFC3161, &e);
        }
        if created {
            Ok(())
        } else {
            Err(SignStage::TimestampEntry)
        }
    }
}
