// crates/apim-policy-core/src/model.rs
// ============================================================================
// Module: Policy Declaration Model
// Description: Typed local representation of a policy attachment.
// Purpose: Hold identity, asset coordinates, configuration, and computed state.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PolicyDeclaration`] is the transient projection of one remote policy
//! attachment. The remote platform owns durable state; declarations are
//! rebuilt from every read-back.
//!
//! Invariants:
//! - [`PolicyScope`] and [`AssetCoordinates`] are immutable after creation.
//! - [`RemoteAttributes`] are written only from remote documents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::configuration::PolicyConfiguration;
use crate::configuration::PolicyKind;
use crate::identifiers::PolicyId;
use crate::pointcut::PointcutCondition;

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Organization / environment / API instance addressing a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PolicyScope {
    /// Organization (business group) id.
    pub org_id: String,
    /// Environment id.
    pub env_id: String,
    /// API instance id.
    pub api_instance_id: String,
}

/// Exchange coordinates of the attached policy template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssetCoordinates {
    /// Asset group id.
    pub asset_group_id: String,
    /// Asset id.
    pub asset_id: String,
    /// Asset version.
    pub asset_version: String,
}

// ============================================================================
// SECTION: Remote Attributes
// ============================================================================

/// Audit timestamps reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyAudit {
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Read-only attributes assigned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteAttributes {
    /// Execution order.
    pub order: Option<i64>,
    /// Policy template id.
    pub policy_template_id: Option<String>,
    /// Master organization id.
    pub master_organization_id: Option<String>,
    /// Audit timestamps.
    pub audit: Option<PolicyAudit>,
}

// ============================================================================
// SECTION: Declaration
// ============================================================================

/// Declared policy attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDeclaration {
    /// Addressing scope.
    pub scope: PolicyScope,
    /// Policy template coordinates.
    pub asset: AssetCoordinates,
    /// Policy-type specific configuration.
    pub configuration: PolicyConfiguration,
    /// Conditions restricting where the policy applies; empty applies everywhere.
    pub pointcut_conditions: Vec<PointcutCondition>,
    /// Whether the policy is disabled.
    pub disabled: bool,
    /// Platform-assigned id, set after creation.
    pub id: Option<PolicyId>,
    /// Read-only platform attributes.
    pub remote: RemoteAttributes,
}

impl PolicyDeclaration {
    /// Creates an enabled declaration with no pointcuts and no remote state.
    #[must_use]
    pub fn new(
        scope: PolicyScope,
        asset: AssetCoordinates,
        configuration: PolicyConfiguration,
    ) -> Self {
        Self {
            scope,
            asset,
            configuration,
            pointcut_conditions: Vec::new(),
            disabled: false,
            id: None,
            remote: RemoteAttributes::default(),
        }
    }

    /// Returns the policy kind carried by the configuration.
    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        self.configuration.kind()
    }

    /// Lists the immutable attributes that differ from `other`.
    #[must_use]
    pub fn replacement_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.scope.org_id != other.scope.org_id {
            fields.push("org_id");
        }
        if self.scope.env_id != other.scope.env_id {
            fields.push("env_id");
        }
        if self.scope.api_instance_id != other.scope.api_instance_id {
            fields.push("api_instance_id");
        }
        if self.asset.asset_group_id != other.asset.asset_group_id {
            fields.push("asset_group_id");
        }
        if self.asset.asset_id != other.asset.asset_id {
            fields.push("asset_id");
        }
        if self.asset.asset_version != other.asset.asset_version {
            fields.push("asset_version");
        }
        fields
    }
}
