// crates/apim-policy-core/src/error.rs
// ============================================================================
// Module: Policy Errors
// Description: Error taxonomy for policy lifecycle operations.
// Purpose: Classify failures and render them as field-attributed diagnostics.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyError`] separates failures that never reach the network
//! (validation, mapping, identifiers) from remote and authentication
//! failures. [`PolicyError::diagnostics`] renders any error in the form the
//! host framework reports to users.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::diagnostics::Diagnostics;
use crate::identifiers::IdentifierError;
use crate::interfaces::AuthError;
use crate::validation::ValidationErrors;

// ============================================================================
// SECTION: Operation
// ============================================================================

/// Lifecycle operation labels used in diagnostics and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Policy creation.
    Create,
    /// Policy read.
    Read,
    /// Policy content update.
    Update,
    /// Policy deletion.
    Delete,
    /// Policy enable toggle.
    Enable,
    /// Policy disable toggle.
    Disable,
    /// Policy import.
    Import,
}

impl Operation {
    /// Returns the lowercase verb for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Mapping Error
// ============================================================================

/// Local/remote shape mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct MappingError {
    /// Attribute path of the offending field.
    pub field: String,
    /// Failure description.
    pub message: String,
}

impl MappingError {
    /// Creates a mapping error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Policy Error
// ============================================================================

/// Policy lifecycle errors.
///
/// # Invariants
/// - Validation, mapping, and identifier errors are raised before any remote call
///   that depends on them.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Declared configuration violates one or more rules.
    #[error("invalid policy declaration: {0}")]
    Validation(ValidationErrors),
    /// Remote call failed.
    #[error("unable to {operation} policy {asset_id}: {detail}")]
    Remote {
        /// Failed operation.
        operation: Operation,
        /// Asset id of the policy template.
        asset_id: String,
        /// HTTP status when available.
        status: Option<u16>,
        /// Response body or transport message.
        detail: String,
    },
    /// Local/remote shape mismatch.
    #[error("policy mapping failed: {0}")]
    Mapping(#[from] MappingError),
    /// Credentials could not be acquired.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    /// Composite identifier could not be decomposed.
    #[error("invalid policy identifier: {0}")]
    Identifier(#[from] IdentifierError),
}

impl From<ValidationErrors> for PolicyError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl PolicyError {
    /// Renders the error as user-facing diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match self {
            Self::Validation(errors) => {
                for error in errors.iter() {
                    diagnostics.push(Diagnostic::error(
                        "Invalid policy configuration",
                        error.message.clone(),
                        Some(error.attribute.clone()),
                    ));
                }
            }
            Self::Remote {
                operation,
                asset_id,
                detail,
                ..
            } => diagnostics.push(Diagnostic::error(
                format!("Unable to {operation} policy {asset_id}"),
                detail.clone(),
                None,
            )),
            Self::Mapping(error) => diagnostics.push(Diagnostic::error(
                "Invalid policy configuration",
                error.message.clone(),
                Some(error.field.clone()),
            )),
            Self::Auth(error) => {
                diagnostics.push(Diagnostic::error("Unable to authenticate", error.to_string(), None));
            }
            Self::Identifier(error) => diagnostics.push(Diagnostic::error(
                "Invalid policy identifier",
                error.to_string(),
                Some("id".to_string()),
            )),
        }
        diagnostics
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
