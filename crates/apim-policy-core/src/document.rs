// crates/apim-policy-core/src/document.rs
// ============================================================================
// Module: Remote Policy Documents
// Description: Wire shapes exchanged with the API Manager policy endpoints.
// Purpose: Type the read document and the create/patch bodies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The platform speaks lowerCamelCase JSON. `configurationData` stays an
//! untyped object here; typed interpretation happens in [`crate::parsers`].
//! Numeric identifiers (`apiId`, `policyTemplateId`) are accepted as either
//! numbers or strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::identifiers::PolicyId;

// ============================================================================
// SECTION: Remote Pointcut
// ============================================================================

/// Remote pointcut entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePointcut {
    /// `|`-joined HTTP method alternation.
    pub method_regex: String,
    /// URI template regex.
    pub uri_template_regex: String,
}

// ============================================================================
// SECTION: Remote Audit
// ============================================================================

/// Remote audit timestamp wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteAuditStamp {
    /// ISO-8601 timestamp.
    #[serde(default)]
    pub date: Option<String>,
}

/// Remote audit block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteAudit {
    /// Creation stamp.
    #[serde(default)]
    pub created: Option<RemoteAuditStamp>,
    /// Last update stamp.
    #[serde(default)]
    pub updated: Option<RemoteAuditStamp>,
}

// ============================================================================
// SECTION: Remote Policy Document
// ============================================================================

/// Policy document returned by the platform.
///
/// # Invariants
/// - `configuration_data` is never null; a null wire value reads as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePolicyDocument {
    /// Platform-assigned policy id.
    #[serde(default)]
    pub id: Option<PolicyId>,
    /// Policy template id.
    #[serde(default, deserialize_with = "flexible_string")]
    pub policy_template_id: Option<String>,
    /// Execution order within the API's policy chain.
    #[serde(default)]
    pub order: Option<i64>,
    /// Whether the policy is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Master organization id.
    #[serde(default)]
    pub master_organization_id: Option<String>,
    /// Owning organization id.
    #[serde(default)]
    pub organization_id: Option<String>,
    /// API instance id.
    #[serde(default, deserialize_with = "flexible_string")]
    pub api_id: Option<String>,
    /// Untyped policy configuration.
    #[serde(default, deserialize_with = "null_as_empty_object")]
    pub configuration_data: Map<String, Value>,
    /// Pointcut data; null or absent applies everywhere.
    #[serde(default)]
    pub pointcut_data: Option<Vec<RemotePointcut>>,
    /// Policy template asset group id.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Policy template asset id.
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Policy template asset version.
    #[serde(default)]
    pub asset_version: Option<String>,
    /// Audit stamps.
    #[serde(default)]
    pub audit: Option<RemoteAudit>,
}

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// Body submitted to attach a new policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyBody {
    /// Remote policy configuration.
    pub configuration_data: Map<String, Value>,
    /// Pointcut data; omitted when the policy applies everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointcut_data: Option<Vec<RemotePointcut>>,
    /// Policy template asset group id.
    pub group_id: String,
    /// Policy template asset id.
    pub asset_id: String,
    /// Policy template asset version.
    pub asset_version: String,
}

/// Body submitted to update an attached policy.
///
/// # Invariants
/// - `pointcut_data` is always serialized; `null` clears existing conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPolicyBody {
    /// Remote policy configuration.
    pub configuration_data: Map<String, Value>,
    /// Pointcut data; `None` serializes as `null`.
    #[serde(default)]
    pub pointcut_data: Option<Vec<RemotePointcut>>,
}

// ============================================================================
// SECTION: Deserialization Helpers
// ============================================================================

/// Accepts strings, numbers, or null for identifier-like fields.
fn flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(other) => {
            Err(serde::de::Error::custom(format!("expected string or number, got {other}")))
        }
    }
}

/// Reads a null configuration object as empty.
fn null_as_empty_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
