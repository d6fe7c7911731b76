//! End-to-end workload tests against a wiremock stand-in for every service.
//!
//! All services share one mock server (`ServiceConfig::single_host`); mocks
//! are distinguished by method and path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tasperf_client::{OidcCredentials, ServiceConfig, TasClient};
use tasperf_core::{BearerToken, CheckRecorder, EntryPool, EntryUuid, HarnessError, Workload};
use tasperf_load::scenario::{Scenario, ScenarioConfig};
use tasperf_load::sign::{checks as sign_checks, SignStage};
use tasperf_load::verify::{checks as verify_checks, VerifyOutcome};
use tasperf_load::{run, RunPlan, SigningWorkflow, TokenMode, TokenSource, VerifyWorkflow};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use zeroize::Zeroizing;

const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBfake\n-----END CERTIFICATE-----";

fn test_client(mock_server: &MockServer) -> TasClient {
    TasClient::new(ServiceConfig::single_host(&mock_server.uri()).unwrap()).unwrap()
}

fn creds(mock_server: &MockServer) -> OidcCredentials {
    OidcCredentials {
        issuer_url: format!("{}/realms/tas", mock_server.uri()),
        user: "jdoe".into(),
        password: Zeroizing::new("secure".into()),
        client_id: "trusted-artifact-signer".into(),
    }
}

fn shared_token() -> TokenSource {
    TokenSource::Shared(Arc::new(BearerToken::new("test-token").unwrap()))
}

fn bundle_json() -> serde_json::Value {
    serde_json::json!({
        "publicKeyBase64": "QQ==",
        "signedEmailAddress": "Zm9v",
        "artifactSignature": "YmFy",
        "artifactHash": "deadbeef"
    })
}

fn entry_response(uuid: &str) -> serde_json::Value {
    let decoded = serde_json::json!({
        "apiVersion": "0.0.1",
        "kind": "hashedrekord",
        "spec": { "signature": { "content": "YmFy" } }
    });
    let body = STANDARD.encode(decoded.to_string());
    let mut map = serde_json::Map::new();
    map.insert(uuid.to_string(), serde_json::json!({ "body": body, "logIndex": 1 }));
    serde_json::Value::Object(map)
}

async fn mount_helper(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/generate-payloads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json()))
        .mount(mock_server)
        .await;
}

async fn mount_fulcio(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .respond_with(ResponseTemplate::new(201).set_body_string(format!("{PEM}\n")))
        .mount(mock_server)
        .await;
}

async fn mount_token(mock_server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/realms/tas/protocol/openid-connect/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "eyJhbGciOi" })),
        )
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

/// Answers every append with a fresh identifier in `Location`.
struct SequentialLocation {
    next: AtomicU64,
}

impl SequentialLocation {
    fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }
}

impl Respond for SequentialLocation {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(201)
            .insert_header("Location", format!("/api/v1/log/entries/entry-{n:06}").as_str())
    }
}

fn hashed_rekord_requests(requests: &[Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/api/v1/log/entries")
        .filter(|r| {
            serde_json::from_slice::<serde_json::Value>(&r.body)
                .map(|v| v["kind"] == "hashedrekord")
                .unwrap_or(false)
        })
        .count()
}

// ── Signing workflow ──────────────────────────────────────────────────

#[tokio::test]
async fn signing_publishes_identifier_from_location() {
    let mock_server = MockServer::start().await;
    mount_helper(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "publicKey": { "content": "QQ==" },
            "signedEmailAddress": "Zm9v"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(format!("preamble\n{PEM}\n-----BEGIN CERTIFICATE-----\nMIIBroot\n-----END CERTIFICATE-----\n")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .and(body_partial_json(serde_json::json!({
            "apiVersion": "0.0.1",
            "kind": "hashedrekord",
            "spec": {
                "signature": {
                    "content": "YmFy",
                    "publicKey": { "content": STANDARD.encode(PEM) }
                },
                "data": { "hash": { "algorithm": "sha256", "value": "deadbeef" } }
            }
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "/api/v1/log/entries/1234-uuid"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, false).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.published, EntryUuid::new("1234-uuid"));
    assert!(outcome.is_success());
    assert_eq!(outcome.timestamp_entry, None);
    assert_eq!(recorder.tally(sign_checks::FULCIO_CREATED).passes, 1);
    assert_eq!(recorder.tally(sign_checks::HASHED_CREATED).passes, 1);
}

#[tokio::test]
async fn fulcio_failure_skips_log_append() {
    let mock_server = MockServer::start().await;
    mount_helper(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, false).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.published, None);
    assert_eq!(outcome.failed_stage, Some(SignStage::Certificate));
    assert_eq!(recorder.tally(sign_checks::FULCIO_CREATED).fails, 1);
    assert_eq!(recorder.tally(sign_checks::HASHED_CREATED).passes + recorder.tally(sign_checks::HASHED_CREATED).fails, 0);

    // The VU loop continues: a second iteration runs the same stages.
    let again = workflow.run(&shared_token()).await;
    assert_eq!(again.failed_stage, Some(SignStage::Certificate));
    assert_eq!(recorder.tally(sign_checks::FULCIO_CREATED).fails, 2);
}

#[tokio::test]
async fn created_without_pem_block_is_a_failed_certificate_stage() {
    let mock_server = MockServer::start().await;
    mount_helper(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .respond_with(ResponseTemplate::new(201).set_body_string("{\"signedCertificateEmbeddedSct\":{}}"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, false).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.failed_stage, Some(SignStage::Certificate));
    assert_eq!(recorder.tally(sign_checks::FULCIO_CREATED).passes, 1);
    assert_eq!(recorder.tally(sign_checks::FULCIO_HAS_CERT).fails, 1);
}

#[tokio::test]
async fn helper_failure_ends_iteration() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/generate-payloads"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let workflow =
        SigningWorkflow::new(test_client(&mock_server), CheckRecorder::new("sign"), None, true).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.failed_stage, Some(SignStage::CryptoMaterial));
    assert_eq!(outcome.timestamp_entry, None);
}

#[tokio::test]
async fn malformed_helper_payload_passes_the_status_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/generate-payloads"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, true).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.failed_stage, Some(SignStage::CryptoMaterial));
    assert_eq!(recorder.tally(sign_checks::HELPER_OK).passes, 1);
    assert_eq!(recorder.tally(sign_checks::HELPER_OK).fails, 0);
    assert_eq!(recorder.tally(sign_checks::HELPER_PAYLOAD).fails, 1);
}

#[tokio::test]
async fn missing_location_is_success_without_publish() {
    let mock_server = MockServer::start().await;
    mount_helper(&mock_server).await;
    mount_fulcio(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, false).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.published, None);
    assert_eq!(recorder.tally(sign_checks::HASHED_LOCATION).fails, 1);
}

#[tokio::test]
async fn timestamp_branch_runs_even_when_certificate_fails() {
    let mock_server = MockServer::start().await;
    mount_helper(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // "YmFy" decodes to "bar"; the helper receives the raw bytes.
    Mock::given(method("POST"))
        .and(path("/get-timestamp"))
        .and(header("content-type", "application/octet-stream"))
        .and(wiremock::matchers::body_bytes(b"bar".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x30u8, 0x82, 0x01]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .and(body_partial_json(serde_json::json!({
            "kind": "rfc3161",
            "spec": { "tsr": { "content": STANDARD.encode([0x30u8, 0x82, 0x01]) } }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, true).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.failed_stage, Some(SignStage::Certificate));
    assert_eq!(outcome.timestamp_entry, Some(true));
    assert_eq!(recorder.tally(sign_checks::TSA_OK).passes, 1);
    assert_eq!(recorder.tally(sign_checks::RFC3161_CREATED).passes, 1);
}

#[tokio::test]
async fn undecodable_signature_fails_only_the_timestamp_branch() {
    let mock_server = MockServer::start().await;
    let mut bundle = bundle_json();
    bundle["artifactSignature"] = serde_json::json!("not*base64");
    Mock::given(method("GET"))
        .and(path("/generate-payloads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle))
        .mount(&mock_server)
        .await;
    mount_fulcio(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "/api/v1/log/entries/abc"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get-timestamp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("sign");
    let workflow = SigningWorkflow::new(test_client(&mock_server), recorder.clone(), None, true).unwrap();
    let outcome = workflow.run(&shared_token()).await;

    assert_eq!(outcome.published, EntryUuid::new("abc"));
    assert_eq!(outcome.failed_stage, None);
    assert_eq!(outcome.timestamp_entry, Some(false));
    assert_eq!(recorder.tally(sign_checks::SIGNATURE_DECODES).fails, 1);
}

#[tokio::test]
async fn per_iteration_tokens_are_fetched_every_time() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 2).await;
    mount_helper(&mock_server).await;
    mount_fulcio(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(SequentialLocation::new())
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let tokens = TokenSource::prepare(&client, creds(&mock_server), TokenMode::PerIteration)
        .await
        .unwrap();
    let workflow = SigningWorkflow::new(client, CheckRecorder::new("sign"), Some("small".into()), false).unwrap();

    let first = workflow.run(&tokens).await;
    let second = workflow.run(&tokens).await;
    assert_ne!(first.published, second.published);
}

// ── Verification workflow ─────────────────────────────────────────────

#[tokio::test]
async fn empty_pool_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let workflow = VerifyWorkflow::new(test_client(&mock_server), CheckRecorder::new("verify"), true);
    assert_eq!(workflow.run(&EntryPool::new()).await, VerifyOutcome::Idle);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_entry_body_fails_json_check() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/log/entries/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "abc": { "body": "!!not base64!!" }
        })))
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("verify");
    let workflow = VerifyWorkflow::new(test_client(&mock_server), recorder.clone(), false);
    let pool = EntryPool::from_entries([EntryUuid::new("abc").unwrap()]);
    let outcome = workflow.run(&pool).await;

    assert_eq!(
        outcome,
        VerifyOutcome::Verified {
            uuid: EntryUuid::new("abc").unwrap(),
            passed: false
        }
    );
    assert_eq!(recorder.tally(verify_checks::REKOR_GET_OK).passes, 1);
    assert_eq!(recorder.tally(verify_checks::CONTAINS_UUID).passes, 1);
    assert_eq!(recorder.tally(verify_checks::INVALID_JSON).fails, 1);
}

#[tokio::test]
async fn verification_is_idempotent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/log/entries/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entry_response("abc")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certchain"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PEM))
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("verify");
    let workflow = VerifyWorkflow::new(test_client(&mock_server), recorder.clone(), true);
    let id = EntryUuid::new("abc").unwrap();

    let first = workflow.verify(&id).await;
    let after_first = recorder.summary(0).checks;
    let second = workflow.verify(&id).await;
    let after_second = recorder.summary(0).checks;

    assert!(first);
    assert_eq!(first, second);
    for (name, tally) in &after_first {
        assert_eq!(after_second[name].passes, tally.passes * 2, "{name}");
        assert_eq!(after_second[name].fails, 0, "{name}");
    }
    assert_eq!(recorder.tally(verify_checks::TSA_CHAIN_OK).passes, 2);
}

#[tokio::test]
async fn missing_entry_fails_status_check_only() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/log/entries/.+$"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let recorder = CheckRecorder::new("verify");
    let workflow = VerifyWorkflow::new(test_client(&mock_server), recorder.clone(), false);
    assert!(!workflow.verify(&EntryUuid::new("gone").unwrap()).await);
    assert_eq!(recorder.tally(verify_checks::REKOR_GET_OK).fails, 1);
    assert_eq!(recorder.tally(verify_checks::CONTAINS_UUID), Default::default());
}

// ── Scheduler ─────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_signers_publish_every_append_exactly_once() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;
    mount_helper(&mock_server).await;
    mount_fulcio(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(SequentialLocation::new())
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/log/entries/entry-\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("published.txt");
    let cfg = ScenarioConfig {
        sign_vus: 6,
        verify_vus: 3,
        duration: Duration::from_millis(400),
        uuid_out: Some(out.clone()),
        ..ScenarioConfig::default()
    };
    let plan = RunPlan::new(Scenario::SignVerify, &cfg).unwrap();
    let recorder = CheckRecorder::new("sign-verify");
    let summary = run(plan, test_client(&mock_server), creds(&mock_server), recorder)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let appends = hashed_rekord_requests(&requests);
    let sign = summary.iterations[&Workload::Sign];

    assert!(appends > 0);
    assert_eq!(summary.pool_size, appends);
    assert_eq!(sign.completed as usize, appends);
    assert_eq!(sign.failed, 0);

    let written = EntryPool::load(&out).unwrap().snapshot();
    assert_eq!(written.len(), appends);
    let unique: std::collections::BTreeSet<_> = written.iter().map(|u| u.as_str().to_string()).collect();
    assert_eq!(unique.len(), appends);
}

#[tokio::test]
async fn failing_iterations_do_not_stop_signing_vus() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;
    mount_helper(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/signingCert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/log/entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cfg = ScenarioConfig {
        sign_vus: 2,
        duration: Duration::from_millis(200),
        token_mode: Some(TokenMode::Once),
        timestamp_branch: Some(false),
        ..ScenarioConfig::default()
    };
    let plan = RunPlan::new(Scenario::Sign, &cfg).unwrap();
    let summary = run(plan, test_client(&mock_server), creds(&mock_server), CheckRecorder::new("sign"))
        .await
        .unwrap();

    let sign = summary.iterations[&Workload::Sign];
    assert_eq!(sign.completed, 0);
    assert!(sign.failed > 2, "each VU should keep iterating: {sign:?}");
    assert_eq!(summary.pool_size, 0);
    assert_eq!(summary.checks[sign_checks::FULCIO_CREATED].fails, sign.failed);
}

#[tokio::test]
async fn authentication_failure_aborts_before_any_vu() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/tas/protocol/openid-connect/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cfg = ScenarioConfig {
        duration: Duration::from_millis(100),
        ..ScenarioConfig::default()
    };
    let plan = RunPlan::new(Scenario::SignVerify, &cfg).unwrap();
    let err = run(plan, test_client(&mock_server), creds(&mock_server), CheckRecorder::new("sign-verify"))
        .await
        .unwrap_err();

    match err {
        HarnessError::Authentication { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_grant");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credentials_abort_without_network() {
    let mock_server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cfg = ScenarioConfig {
        duration: Duration::from_millis(100),
        ..ScenarioConfig::default()
    };
    let mut partial = creds(&mock_server);
    partial.client_id.clear();

    for scenario in [Scenario::Sign, Scenario::SignVerify] {
        let plan = RunPlan::new(scenario, &cfg).unwrap();
        let err = run(plan, test_client(&mock_server), partial.clone(), CheckRecorder::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)), "{scenario}: {err}");
    }
}

#[tokio::test]
async fn verify_scenario_samples_identifier_file() {
    let mock_server = MockServer::start().await;
    for id in ["aaa", "bbb"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/log/entries/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(entry_response(id)))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/certchain"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PEM))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("uuids.txt");
    std::fs::write(&file, "aaa\n\n  bbb  \n").unwrap();
    let sampled = dir.path().join("sampled.txt");

    let cfg = ScenarioConfig {
        verify_vus: 2,
        duration: Duration::from_millis(200),
        uuid_file: file,
        uuid_out: Some(sampled.clone()),
        ..ScenarioConfig::default()
    };
    let plan = RunPlan::new(Scenario::Verify, &cfg).unwrap();
    let summary = run(plan, test_client(&mock_server), OidcCredentials::default(), CheckRecorder::new("verify"))
        .await
        .unwrap();

    let verify = summary.iterations[&Workload::Verify];
    assert!(verify.completed > 0);
    assert_eq!(verify.failed, 0);
    assert_eq!(summary.pool_size, 2);
    assert_eq!(summary.failed_checks(), 0);
    assert!(summary.checks[verify_checks::TSA_CHAIN_OK].passes > 0);
    assert!(!summary.iterations.contains_key(&Workload::Sign));
    assert_eq!(std::fs::read_to_string(&sampled).unwrap(), "aaa\nbbb\n");
}

#[tokio::test]
async fn verify_scenario_idles_on_empty_file() {
    let mock_server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("uuids.txt");
    std::fs::write(&file, "\n\n").unwrap();

    let cfg = ScenarioConfig {
        verify_vus: 2,
        duration: Duration::from_millis(100),
        uuid_file: file,
        ..ScenarioConfig::default()
    };
    let plan = RunPlan::new(Scenario::Verify, &cfg).unwrap();
    let summary = run(plan, test_client(&mock_server), OidcCredentials::default(), CheckRecorder::new("verify"))
        .await
        .unwrap();

    let verify = summary.iterations[&Workload::Verify];
    assert!(verify.idle > 0);
    assert_eq!(verify.completed + verify.failed, 0);
}
