// crates/apim-policy-client/src/connect.rs
// ============================================================================
// Module: Client Assembly
// Description: Builds a lifecycle orchestrator from loaded configuration.
// Purpose: Wire transport, credentials, and the audit sink in one place.
// Dependencies: apim-policy-config, apim-policy-core
// ============================================================================

//! ## Overview
//! Builds a lifecycle orchestrator from loaded configuration, wiring
//! transport, credentials, and the audit sink in one place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use apim_policy_config::ApimPolicyConfig;
use apim_policy_config::AuditConfig;
use apim_policy_config::AuditSinkKind;
use apim_policy_core::FileAuditSink;
use apim_policy_core::NoopAuditSink;
use apim_policy_core::PolicyAuditSink;
use apim_policy_core::PolicyLifecycle;
use apim_policy_core::StderrAuditSink;

use crate::auth::ConfiguredAuth;
use crate::error::ClientError;
use crate::http::HttpPolicyOperations;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle orchestrator backed by the HTTP transport.
pub type HttpPolicyLifecycle = PolicyLifecycle<HttpPolicyOperations, ConfiguredAuth>;

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds a lifecycle orchestrator from configuration.
///
/// # Errors
///
/// Returns [`ClientError`] when credentials, the HTTP client, or the audit
/// sink cannot be set up.
pub fn connect(config: &ApimPolicyConfig) -> Result<HttpPolicyLifecycle, ClientError> {
    let operations = HttpPolicyOperations::new(&config.http)?;
    let auth = ConfiguredAuth::from_config(config)?;
    Ok(PolicyLifecycle::new(operations, auth).with_audit_sink(audit_sink(&config.audit)?))
}

/// Opens the configured audit sink.
///
/// # Errors
///
/// Returns [`ClientError::Audit`] when the audit file cannot be opened.
pub fn audit_sink(config: &AuditConfig) -> Result<Arc<dyn PolicyAuditSink>, ClientError> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkKind::File, Some(path)) => FileAuditSink::new(Path::new(path.trim()))
            .map(|sink| Arc::new(sink) as Arc<dyn PolicyAuditSink>)
            .map_err(|err| ClientError::Audit(err.to_string())),
        (AuditSinkKind::File, None) => {
            Err(ClientError::Audit("audit.path is required for the file sink".to_string()))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::missing_docs_in_private_items,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn file_sink_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let config = AuditConfig {
            sink: AuditSinkKind::File,
            path: Some(path.to_string_lossy().into_owned()),
        };
        audit_sink(&config).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_sink_reports_unopenable_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditConfig {
            sink: AuditSinkKind::File,
            path: Some(dir.path().join("missing").join("audit.jsonl").to_string_lossy().into_owned()),
        };
        assert!(matches!(audit_sink(&config), Err(ClientError::Audit(_))));
    }
}
