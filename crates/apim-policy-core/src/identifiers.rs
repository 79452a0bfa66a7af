// crates/apim-policy-core/src/identifiers.rs
// ============================================================================
// Module: Policy Identifiers
// Description: Platform policy ids and composite import identifiers.
// Purpose: Provide typed identifiers with stable wire and import forms.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyId`] is the opaque identifier the platform assigns on creation. The
//! platform emits it as a JSON number; it is held as a string so that import
//! strings and state files share one form.
//!
//! [`CompositeId`] encodes `(organization, environment, api instance, policy)`
//! as `org/env/api/policy`. It backs import and reads of legacy state whose
//! stored id is composite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de;
use serde_json::Value;
use thiserror::Error;

use crate::model::PolicyScope;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator between composite identifier parts.
pub const COMPOSITE_ID_SEPARATOR: &str = "/";
/// Number of parts in a composite identifier.
const COMPOSITE_ID_PARTS: usize = 4;

// ============================================================================
// SECTION: Policy Id
// ============================================================================

/// Platform-assigned policy identifier.
///
/// # Invariants
/// - Opaque; numeric wire values are stored in their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Creates a new policy identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when this stored id is a composite import identifier.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        is_composite(&self.0)
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PolicyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PolicyId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for PolicyId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(Self(id)),
            Value::Number(id) => Ok(Self(id.to_string())),
            other => Err(de::Error::custom(format!(
                "policy id must be a string or number, got {other}"
            ))),
        }
    }
}

// ============================================================================
// SECTION: Composite Id
// ============================================================================

/// Composite identifier errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier does not split into exactly four parts.
    #[error("composite id must have {expected} parts separated by \"/\", got {actual}")]
    WrongPartCount {
        /// Expected number of parts.
        expected: usize,
        /// Actual number of parts.
        actual: usize,
    },
    /// A part of the identifier is empty.
    #[error("composite id part {position} ({name}) is empty")]
    EmptyPart {
        /// Zero-based position of the empty part.
        position: usize,
        /// Field name of the empty part.
        name: &'static str,
    },
}

/// Composite `org/env/api/policy` identifier.
///
/// # Invariants
/// - All four parts are non-empty and contain no separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    /// Organization (business group) identifier.
    pub org_id: String,
    /// Environment identifier.
    pub env_id: String,
    /// API instance identifier.
    pub api_instance_id: String,
    /// Policy identifier.
    pub policy_id: PolicyId,
}

impl CompositeId {
    /// Builds a composite identifier from a scope and policy id.
    #[must_use]
    pub fn new(scope: &PolicyScope, policy_id: PolicyId) -> Self {
        Self {
            org_id: scope.org_id.clone(),
            env_id: scope.env_id.clone(),
            api_instance_id: scope.api_instance_id.clone(),
            policy_id,
        }
    }

    /// Decomposes a composite identifier by positional split.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the part count is wrong or a part is empty.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let parts: Vec<&str> = raw.split(COMPOSITE_ID_SEPARATOR).collect();
        if parts.len() != COMPOSITE_ID_PARTS {
            return Err(IdentifierError::WrongPartCount {
                expected: COMPOSITE_ID_PARTS,
                actual: parts.len(),
            });
        }
        let names = ["org_id", "env_id", "api_instance_id", "policy_id"];
        for (position, (part, name)) in parts.iter().zip(names).enumerate() {
            if part.is_empty() {
                return Err(IdentifierError::EmptyPart {
                    position,
                    name,
                });
            }
        }
        Ok(Self {
            org_id: parts[0].to_string(),
            env_id: parts[1].to_string(),
            api_instance_id: parts[2].to_string(),
            policy_id: PolicyId::new(parts[3]),
        })
    }

    /// Returns the scope encoded by this identifier.
    #[must_use]
    pub fn scope(&self) -> PolicyScope {
        PolicyScope {
            org_id: self.org_id.clone(),
            env_id: self.env_id.clone(),
            api_instance_id: self.api_instance_id.clone(),
        }
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.org_id,
            self.env_id,
            self.api_instance_id,
            self.policy_id,
            sep = COMPOSITE_ID_SEPARATOR
        )
    }
}

/// Returns true when the identifier looks composite (contains the separator).
#[must_use]
pub fn is_composite(raw: &str) -> bool {
    raw.contains(COMPOSITE_ID_SEPARATOR)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
