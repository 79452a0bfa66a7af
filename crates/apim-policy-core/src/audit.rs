// crates/apim-policy-core/src/audit.rs
// ============================================================================
// Module: Policy Audit Logging
// Description: Structured audit events for policy lifecycle calls.
// Purpose: Emit redacted JSON-lines events without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every remote call and every rejected validation produces one
//! [`PolicyAuditEvent`]. Sinks serialize events as JSON lines.
//!
//! Security posture: events carry identifiers and outcomes only. Tokens and
//! configuration payloads are never recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::error::Operation;
use crate::model::PolicyScope;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event label for remote calls.
pub const REMOTE_CALL_EVENT: &str = "apim_policy_remote_call";
/// Event label for rejected validations.
pub const VALIDATION_EVENT: &str = "apim_policy_validation";

/// Audit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Call succeeded.
    Ok,
    /// Call failed.
    Error,
}

/// Policy audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle operation.
    pub operation: Operation,
    /// Outcome.
    pub outcome: AuditOutcome,
    /// Organization id.
    pub org_id: String,
    /// Environment id.
    pub env_id: String,
    /// API instance id.
    pub api_instance_id: String,
    /// Policy id when known.
    pub policy_id: Option<String>,
    /// Policy template asset id.
    pub asset_id: String,
    /// HTTP status when available.
    pub status: Option<u16>,
    /// Error summary when the outcome is an error.
    pub error: Option<String>,
}

impl PolicyAuditEvent {
    /// Creates a remote-call event with a consistent timestamp.
    #[must_use]
    pub fn remote_call(
        operation: Operation,
        scope: &PolicyScope,
        policy_id: Option<String>,
        asset_id: &str,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: REMOTE_CALL_EVENT,
            timestamp_ms,
            operation,
            outcome: AuditOutcome::Ok,
            org_id: scope.org_id.clone(),
            env_id: scope.env_id.clone(),
            api_instance_id: scope.api_instance_id.clone(),
            policy_id,
            asset_id: asset_id.to_string(),
            status: None,
            error: None,
        }
    }

    /// Creates a validation-rejection event.
    #[must_use]
    pub fn validation(
        operation: Operation,
        scope: &PolicyScope,
        asset_id: &str,
        error: String,
    ) -> Self {
        let mut event = Self::remote_call(operation, scope, None, asset_id);
        event.event = VALIDATION_EVENT;
        event.outcome = AuditOutcome::Error;
        event.error = Some(error);
        event
    }

    /// Marks the event as failed.
    #[must_use]
    pub fn failed(mut self, status: Option<u16>, error: String) -> Self {
        self.outcome = AuditOutcome::Error;
        self.status = status;
        self.error = Some(error);
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for policy events.
pub trait PolicyAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &PolicyAuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl PolicyAuditSink for StderrAuditSink {
    fn record(&self, event: &PolicyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl PolicyAuditSink for FileAuditSink {
    fn record(&self, event: &PolicyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink writing JSON lines to any writer.
pub struct WriterAuditSink<W: Write + Send> {
    /// Writer guarded for shared use.
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterAuditSink<W> {
    /// Wraps a writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    ///
    /// # Errors
    ///
    /// Returns an error when the writer lock was poisoned.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|_| io::Error::other("audit writer lock poisoned"))
    }
}

impl<W: Write + Send> PolicyAuditSink for WriterAuditSink<W> {
    fn record(&self, event: &PolicyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut writer) = self.writer.lock()
        {
            let _ = writeln!(writer, "{payload}");
            let _ = writer.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl PolicyAuditSink for NoopAuditSink {
    fn record(&self, _event: &PolicyAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
