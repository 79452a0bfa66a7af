// crates/apim-policy-client/tests/http_operations.rs
// ============================================================================
// Module: HTTP Policy Operations Tests
// Description: Request shape and error mapping against a local HTTP server.
// Purpose: Ensure paths, bearer headers, bodies, and token exchange are correct.
// ============================================================================

//! ## Overview
//! Runs [`HttpPolicyOperations`] and the credential providers against a
//! scripted `tiny_http` server and inspects every captured request.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::thread;

use apim_policy_client::ClientCredentialsAuth;
use apim_policy_client::HttpPolicyOperations;
use apim_policy_client::connect;
use apim_policy_config::ApimPolicyConfig;
use apim_policy_config::HttpConfig;
use apim_policy_core::AssetCoordinates;
use apim_policy_core::AuthError;
use apim_policy_core::AuthProvider;
use apim_policy_core::CreatePolicyBody;
use apim_policy_core::PatchPolicyBody;
use apim_policy_core::PolicyConfiguration;
use apim_policy_core::PolicyDeclaration;
use apim_policy_core::PolicyId;
use apim_policy_core::PolicyOperations;
use apim_policy_core::PolicyScope;
use apim_policy_core::RateLimitTier;
use apim_policy_core::RateLimitingConfig;
use apim_policy_core::RequestContext;
use apim_policy_core::configuration::PUBLIC_POLICY_GROUP_ID;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Request as observed by the scripted server.
#[derive(Debug)]
struct Captured {
    method: String,
    url: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.to_string())
}

/// Serves one scripted response per expected request, in order.
fn serve(responses: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<Captured>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let mut request = server.recv().unwrap();
            let mut text = String::new();
            request.as_reader().read_to_string(&mut text).unwrap();
            captured.push(Captured {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                authorization: header_value(&request, "Authorization"),
                content_type: header_value(&request, "Content-Type"),
                body: text,
            });
            request.respond(Response::from_string(body).with_status_code(status)).unwrap();
        }
        captured
    });
    (format!("http://{addr}"), handle)
}

fn operations() -> HttpPolicyOperations {
    HttpPolicyOperations::new(&HttpConfig {
        timeout_ms: 5_000,
        ..HttpConfig::default()
    })
    .unwrap()
}

fn scope() -> PolicyScope {
    PolicyScope {
        org_id: "org".to_string(),
        env_id: "env".to_string(),
        api_instance_id: "18000001".to_string(),
    }
}

const POLICIES: &str = "/apimanager/api/v1/organizations/org/environments/env/apis/18000001/policies";

fn document(id: u64, disabled: bool) -> String {
    json!({
        "id": id,
        "policyTemplateId": 348_742,
        "order": 1,
        "disabled": disabled,
        "masterOrganizationId": "org",
        "organizationId": "org",
        "apiId": 18_000_001,
        "configurationData": {
            "rateLimits": [{"maximumRequests": 5, "timePeriodInMilliseconds": 1000}],
            "exposeHeaders": false,
            "clusterizable": true
        },
        "pointcutData": null,
        "groupId": PUBLIC_POLICY_GROUP_ID,
        "assetId": "rate-limiting",
        "assetVersion": "1.4.0",
        "audit": {"created": {"date": "2026-10-16T00:00:00.000Z"}, "updated": {}}
    })
    .to_string()
}

fn config_object(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

// ============================================================================
// SECTION: Policy Operations
// ============================================================================

#[test]
fn create_posts_body_with_bearer_token() {
    let (base, handle) = serve(vec![(201, document(4_012_345, false))]);
    let ctx = RequestContext::new(base, "tok-123");
    let body = CreatePolicyBody {
        configuration_data: config_object(json!({"rateLimits": []})),
        pointcut_data: None,
        group_id: PUBLIC_POLICY_GROUP_ID.to_string(),
        asset_id: "rate-limiting".to_string(),
        asset_version: "1.4.0".to_string(),
    };

    let id = operations().create_policy(&ctx, &scope(), &body).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(id, PolicyId::new("4012345"));
    assert_eq!(captured[0].method, "POST");
    assert_eq!(captured[0].url, POLICIES);
    assert_eq!(captured[0].authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));
    let sent: Value = serde_json::from_str(&captured[0].body).unwrap();
    assert_eq!(
        sent,
        json!({
            "configurationData": {"rateLimits": []},
            "groupId": PUBLIC_POLICY_GROUP_ID,
            "assetId": "rate-limiting",
            "assetVersion": "1.4.0"
        })
    );
}

#[test]
fn get_reads_document_with_numeric_ids() {
    let (base, handle) = serve(vec![(200, document(77, true))]);
    let ctx = RequestContext::new(base, "tok");
    let doc = operations().get_policy(&ctx, &scope(), &PolicyId::new("77")).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured[0].method, "GET");
    assert_eq!(captured[0].url, format!("{POLICIES}/77"));
    assert_eq!(doc.id, Some(PolicyId::new("77")));
    assert_eq!(doc.policy_template_id.as_deref(), Some("348742"));
    assert_eq!(doc.api_id.as_deref(), Some("18000001"));
    assert!(doc.disabled);
    assert!(doc.pointcut_data.is_none());
}

#[test]
fn patch_sends_null_pointcuts() {
    let (base, handle) = serve(vec![(200, document(77, false))]);
    let ctx = RequestContext::new(base, "tok");
    let body = PatchPolicyBody {
        configuration_data: config_object(json!({"exposeHeaders": true})),
        pointcut_data: None,
    };
    operations().patch_policy(&ctx, &scope(), &PolicyId::new("77"), &body).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured[0].method, "PATCH");
    assert_eq!(captured[0].url, format!("{POLICIES}/77"));
    let sent: Value = serde_json::from_str(&captured[0].body).unwrap();
    assert_eq!(sent, json!({"configurationData": {"exposeHeaders": true}, "pointcutData": null}));
}

#[test]
fn delete_and_toggles_use_expected_paths() {
    let (base, handle) = serve(vec![
        (204, String::new()),
        (200, String::new()),
        (200, String::new()),
    ]);
    let ctx = RequestContext::new(base, "tok");
    let ops = operations();
    let id = PolicyId::new("77");
    ops.delete_policy(&ctx, &scope(), &id).unwrap();
    ops.enable_policy(&ctx, &scope(), &id).unwrap();
    ops.disable_policy(&ctx, &scope(), &id).unwrap();
    let captured = handle.join().unwrap();

    let requests: Vec<(&str, &str)> =
        captured.iter().map(|c| (c.method.as_str(), c.url.as_str())).collect();
    assert_eq!(
        requests,
        [
            ("DELETE", format!("{POLICIES}/77").as_str()),
            ("POST", format!("{POLICIES}/77/enable").as_str()),
            ("POST", format!("{POLICIES}/77/disable").as_str()),
        ]
    );
}

#[test]
fn client_errors_carry_status_and_body() {
    let (base, handle) = serve(vec![
        (400, "{\"message\":\"Invalid configuration\"}".to_string()),
        (404, "{\"message\":\"Not found\"}".to_string()),
    ]);
    let ctx = RequestContext::new(base, "tok");
    let ops = operations();
    let id = PolicyId::new("77");
    let bad = ops.delete_policy(&ctx, &scope(), &id).unwrap_err();
    let missing = ops.get_policy(&ctx, &scope(), &id).unwrap_err();
    handle.join().unwrap();

    assert_eq!(bad.status, Some(400));
    assert_eq!(bad.detail(), "{\"message\":\"Invalid configuration\"}");
    assert!(missing.is_not_found());
}

#[test]
fn unreachable_server_is_transport_error() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    drop(server);
    let ctx = RequestContext::new(format!("http://{addr}"), "tok");
    let err = operations().get_policy(&ctx, &scope(), &PolicyId::new("1")).unwrap_err();
    assert!(err.status.is_none());
    assert!(err.message.starts_with("request failed"));
}

// ============================================================================
// SECTION: Token Exchange
// ============================================================================

#[test]
fn client_credentials_exchange_posts_form() {
    let (base, handle) = serve(vec![(200, "{\"access_token\":\"abc\",\"expires_in\":3600}".to_string())]);
    let auth = ClientCredentialsAuth::new(base.clone(), "app id", "s3cr&t", &HttpConfig::default())
        .unwrap();
    let ctx = auth.request_context().unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(ctx.bearer_token, "abc");
    assert_eq!(ctx.base_url, base);
    assert_eq!(captured[0].method, "POST");
    assert_eq!(captured[0].url, "/accounts/api/v2/oauth2/token");
    assert_eq!(captured[0].content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(
        captured[0].body,
        "grant_type=client_credentials&client_id=app+id&client_secret=s3cr%26t"
    );
}

#[test]
fn rejected_credentials_are_token_request_errors() {
    let (base, handle) = serve(vec![
        (401, "{\"error\":\"invalid_client\"}".to_string()),
        (200, "{}".to_string()),
    ]);
    let auth = ClientCredentialsAuth::new(base, "app", "wrong", &HttpConfig::default()).unwrap();
    let rejected = auth.request_context().unwrap_err();
    let empty = auth.request_context().unwrap_err();
    handle.join().unwrap();

    match rejected {
        AuthError::TokenRequest(detail) => assert!(detail.contains("invalid_client")),
        other => panic!("expected token request error, got {other:?}"),
    }
    assert!(matches!(empty, AuthError::InvalidResponse(_)));
}

// ============================================================================
// SECTION: Assembled Lifecycle
// ============================================================================

#[test]
fn connected_lifecycle_creates_and_reads_back() {
    let (base, handle) = serve(vec![
        (201, document(4_012_345, false)),
        (200, document(4_012_345, false)),
    ]);
    let config = ApimPolicyConfig::from_toml_str(&format!(
        r#"
        [control_plane]
        base_url = "{base}"
        allow_http = true

        [auth]
        mode = "bearer_token"
        token = "static-token"

        [audit]
        sink = "none"
        "#
    ))
    .unwrap();
    let lifecycle = connect(&config).unwrap();
    let declaration = PolicyDeclaration::new(
        scope(),
        AssetCoordinates {
            asset_group_id: PUBLIC_POLICY_GROUP_ID.to_string(),
            asset_id: "rate-limiting".to_string(),
            asset_version: "1.4.0".to_string(),
        },
        PolicyConfiguration::RateLimiting(RateLimitingConfig {
            rate_limits: vec![RateLimitTier {
                maximum_requests: 5,
                time_period_in_milliseconds: 1000,
            }],
            ..RateLimitingConfig::default()
        }),
    );
    let state = lifecycle.create(&declaration).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(state.id, Some(PolicyId::new("4012345")));
    assert_eq!(state.configuration, declaration.configuration);
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|c| c.authorization.as_deref() == Some("Bearer static-token")));
    assert_eq!(captured[1].url, format!("{POLICIES}/4012345"));
}
