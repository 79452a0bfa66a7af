// crates/apim-policy-core/tests/common/mod.rs
// ============================================================================
// Module: Policy Test Helpers
// Description: In-memory remote platform, auth, and declaration fixtures.
// Purpose: Drive lifecycle tests without network access.
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only helpers use panic-based assertions."
)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use apim_policy_core::AssetCoordinates;
use apim_policy_core::AuthError;
use apim_policy_core::AuthProvider;
use apim_policy_core::CreatePolicyBody;
use apim_policy_core::PatchPolicyBody;
use apim_policy_core::PolicyAuditEvent;
use apim_policy_core::PolicyAuditSink;
use apim_policy_core::PolicyConfiguration;
use apim_policy_core::PolicyDeclaration;
use apim_policy_core::PolicyId;
use apim_policy_core::PolicyOperations;
use apim_policy_core::PolicyScope;
use apim_policy_core::RateLimitTier;
use apim_policy_core::RateLimitingConfig;
use apim_policy_core::RemoteAudit;
use apim_policy_core::RemoteAuditStamp;
use apim_policy_core::RemoteError;
use apim_policy_core::RemotePolicyDocument;
use apim_policy_core::RequestContext;
use apim_policy_core::configuration::PUBLIC_POLICY_GROUP_ID;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Fake Platform
// ============================================================================

#[derive(Default)]
struct PlatformState {
    next_id: u64,
    documents: BTreeMap<String, RemotePolicyDocument>,
    calls: Vec<&'static str>,
    failures: BTreeMap<&'static str, RemoteError>,
    defaults: Map<String, Value>,
}

impl PlatformState {
    /// Adds server-defaulted keys the submitted configuration left out.
    fn apply_defaults(&mut self, id: &str) {
        let defaults = self.defaults.clone();
        if let Some(document) = self.documents.get_mut(id) {
            for (key, value) in defaults {
                document.configuration_data.entry(key).or_insert(value);
            }
        }
    }
}

/// In-memory platform that records every call.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let platform = Self::default();
        platform.state.lock().unwrap().next_id = 4_012_345;
        platform
    }

    /// Returns the ordered call log.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the number of calls named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|call| **call == name).count()
    }

    /// Clears the call log.
    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Makes every call named `name` fail with `error`.
    pub fn fail(&self, name: &'static str, error: RemoteError) {
        self.state.lock().unwrap().failures.insert(name, error);
    }

    /// Fills `defaults` into every created or patched configuration.
    pub fn server_defaults(&self, defaults: Map<String, Value>) {
        self.state.lock().unwrap().defaults = defaults;
    }

    /// Stores a document directly.
    pub fn insert(&self, id: &str, document: RemotePolicyDocument) {
        self.state.lock().unwrap().documents.insert(id.to_string(), document);
    }

    /// Returns a stored document.
    pub fn document(&self, id: &str) -> Option<RemotePolicyDocument> {
        self.state.lock().unwrap().documents.get(id).cloned()
    }

    fn enter(&self, name: &'static str) -> Result<std::sync::MutexGuard<'_, PlatformState>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name);
        if let Some(error) = state.failures.get(name).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

fn not_found(id: &PolicyId) -> RemoteError {
    RemoteError::http(404, Some(format!("{{\"message\":\"policy {id} not found\"}}")), "HTTP 404")
}

impl PolicyOperations for FakePlatform {
    fn create_policy(
        &self,
        _ctx: &RequestContext,
        scope: &PolicyScope,
        body: &CreatePolicyBody,
    ) -> Result<PolicyId, RemoteError> {
        let mut state = self.enter("create")?;
        let id = state.next_id.to_string();
        state.next_id += 1;
        let document = RemotePolicyDocument {
            id: Some(PolicyId::new(id.clone())),
            policy_template_id: Some("348742".to_string()),
            order: Some(1),
            disabled: false,
            master_organization_id: Some(scope.org_id.clone()),
            organization_id: Some(scope.org_id.clone()),
            api_id: Some(scope.api_instance_id.clone()),
            configuration_data: body.configuration_data.clone(),
            pointcut_data: body.pointcut_data.clone(),
            group_id: Some(body.group_id.clone()),
            asset_id: Some(body.asset_id.clone()),
            asset_version: Some(body.asset_version.clone()),
            audit: Some(RemoteAudit {
                created: Some(RemoteAuditStamp {
                    date: Some("2026-10-16T00:00:00.000Z".to_string()),
                }),
                updated: None,
            }),
        };
        state.documents.insert(id.clone(), document);
        state.apply_defaults(&id);
        Ok(PolicyId::new(id))
    }

    fn get_policy(
        &self,
        _ctx: &RequestContext,
        _scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<RemotePolicyDocument, RemoteError> {
        let state = self.enter("get")?;
        state.documents.get(id.as_str()).cloned().ok_or_else(|| not_found(id))
    }

    fn patch_policy(
        &self,
        _ctx: &RequestContext,
        _scope: &PolicyScope,
        id: &PolicyId,
        body: &PatchPolicyBody,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("patch")?;
        let document = state.documents.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
        document.configuration_data = body.configuration_data.clone();
        document.pointcut_data = body.pointcut_data.clone();
        state.apply_defaults(id.as_str());
        Ok(())
    }

    fn delete_policy(
        &self,
        _ctx: &RequestContext,
        _scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("delete")?;
        state.documents.remove(id.as_str()).map(|_| ()).ok_or_else(|| not_found(id))
    }

    fn enable_policy(
        &self,
        _ctx: &RequestContext,
        _scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("enable")?;
        let document = state.documents.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
        document.disabled = false;
        Ok(())
    }

    fn disable_policy(
        &self,
        _ctx: &RequestContext,
        _scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("disable")?;
        let document = state.documents.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
        document.disabled = true;
        Ok(())
    }
}

// ============================================================================
// SECTION: Auth
// ============================================================================

/// Auth provider returning a fixed context and counting acquisitions.
#[derive(Default)]
pub struct FixedAuth {
    pub acquisitions: Mutex<usize>,
    pub fail: bool,
}

impl AuthProvider for FixedAuth {
    fn request_context(&self) -> Result<RequestContext, AuthError> {
        if self.fail {
            return Err(AuthError::TokenRequest("invalid_client".to_string()));
        }
        *self.acquisitions.lock().unwrap() += 1;
        Ok(RequestContext::new("https://anypoint.example.test", "test-token"))
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink keeping events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<PolicyAuditEvent>>,
}

impl PolicyAuditSink for RecordingAuditSink {
    fn record(&self, event: &PolicyAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

pub fn scope() -> PolicyScope {
    PolicyScope {
        org_id: "2f7a1c3e-0b1d-4c55-9d3e-6a0f2b8c9d10".to_string(),
        env_id: "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d".to_string(),
        api_instance_id: "18000001".to_string(),
    }
}

pub fn public_asset(asset_id: &str, version: &str) -> AssetCoordinates {
    AssetCoordinates {
        asset_group_id: PUBLIC_POLICY_GROUP_ID.to_string(),
        asset_id: asset_id.to_string(),
        asset_version: version.to_string(),
    }
}

pub fn rate_limiting_declaration() -> PolicyDeclaration {
    PolicyDeclaration::new(
        scope(),
        public_asset("rate-limiting", "1.4.0"),
        PolicyConfiguration::RateLimiting(RateLimitingConfig {
            rate_limits: vec![RateLimitTier {
                maximum_requests: 100,
                time_period_in_milliseconds: 60_000,
            }],
            key_selector: Some("#[attributes.queryParams['identifier']]".to_string()),
            expose_headers: true,
            clusterizable: true,
        }),
    )
}
