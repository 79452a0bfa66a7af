// crates/apim-policy-core/src/interfaces.rs
// ============================================================================
// Module: Collaborator Interfaces
// Description: Remote operation and authentication seams for the engine.
// Purpose: Keep transport and credentials outside the core crate.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The lifecycle orchestrator depends on two collaborators:
//! - [`PolicyOperations`] performs single remote round trips.
//! - [`AuthProvider`] issues a fresh [`RequestContext`] per entry point.
//!
//! Security posture: bearer tokens are never rendered by `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::document::CreatePolicyBody;
use crate::document::PatchPolicyBody;
use crate::document::RemotePolicyDocument;
use crate::identifiers::PolicyId;
use crate::model::PolicyScope;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Authenticated per-operation request context.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Control-plane base URL (no trailing slash).
    pub base_url: String,
    /// Bearer token for the `Authorization` header.
    pub bearer_token: String,
}

impl RequestContext {
    /// Creates a request context, trimming any trailing slash from the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Remote call failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status when a response was received.
    pub status: Option<u16>,
    /// Response body when a response was received.
    pub body: Option<String>,
    /// Failure description.
    pub message: String,
}

impl RemoteError {
    /// Creates an error for a received HTTP response.
    #[must_use]
    pub fn http(status: u16, body: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body,
            message: message.into(),
        }
    }

    /// Creates an error for a failure with no HTTP response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Returns the user-facing detail: the body for HTTP errors, else the message.
    #[must_use]
    pub fn detail(&self) -> &str {
        match (self.status, self.body.as_deref()) {
            (Some(status), Some(body)) if status >= 400 && !body.trim().is_empty() => body,
            _ => &self.message,
        }
    }

    /// Returns true when the remote reported the policy as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Credential acquisition failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Required credential was not configured.
    #[error("missing credential: {0}")]
    MissingCredential(String),
    /// Token endpoint call failed.
    #[error("token request failed: {0}")]
    TokenRequest(String),
    /// Token endpoint returned an unusable response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Issues authenticated request contexts.
pub trait AuthProvider {
    /// Acquires a fresh request context.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when credentials cannot be acquired.
    fn request_context(&self) -> Result<RequestContext, AuthError>;
}

/// Remote policy operations, one round trip each.
pub trait PolicyOperations {
    /// Attaches a policy and returns its platform id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn create_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        body: &CreatePolicyBody,
    ) -> Result<PolicyId, RemoteError>;

    /// Reads a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn get_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<RemotePolicyDocument, RemoteError>;

    /// Updates policy content.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn patch_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
        body: &PatchPolicyBody,
    ) -> Result<(), RemoteError>;

    /// Detaches a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn delete_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError>;

    /// Enables a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn enable_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError>;

    /// Disables a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or HTTP failure.
    fn disable_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError>;
}

// ============================================================================
// SECTION: Tests
// ============================================================================
