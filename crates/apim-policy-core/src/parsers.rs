// crates/apim-policy-core/src/parsers.rs
// ============================================================================
// Module: Policy Configuration Parsers
// Description: Rebuild declarations from remote policy documents.
// Purpose: Invert the builders while keeping client-only declared fields.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Parsing never starts from an empty configuration. Remote values are laid
//! over a copy of the previous declaration so fields the platform does not
//! echo survive a read-after-write:
//! - flat fields: remote wins when present and non-null;
//! - logging rules: matched to previous rules by `name`;
//! - rate-limit tiers: matched by position;
//! - custom claims: matched by `key`;
//! - custom policies: shallow JSON merge, remote wins.
//!
//! Pointcuts and platform-assigned attributes always come from the remote
//! document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::builders::ITEM_DATA_KEY;
use crate::builders::ITEM_NAME_KEY;
use crate::builders::LOGGING_CONFIGURATION_KEY;
use crate::codec::to_local_key;
use crate::codec::to_local_object;
use crate::configuration::ClientIdEnforcementConfig;
use crate::configuration::CustomPolicyConfig;
use crate::configuration::JwtValidationConfig;
use crate::configuration::LoggingRule;
use crate::configuration::MessageLoggingConfig;
use crate::configuration::PolicyConfiguration;
use crate::configuration::PolicyKind;
use crate::configuration::RateLimitingConfig;
use crate::configuration::json_type_name;
use crate::configuration::local_map_of;
use crate::configuration::typed_from_local;
use crate::document::RemotePolicyDocument;
use crate::error::MappingError;
use crate::model::AssetCoordinates;
use crate::model::PolicyAudit;
use crate::model::PolicyDeclaration;
use crate::model::PolicyScope;
use crate::model::RemoteAttributes;
use crate::pointcut::decode_pointcuts;

// ============================================================================
// SECTION: Nested Keys
// ============================================================================

/// Declared keys of JWT custom-claim lists.
const CLAIM_LIST_KEYS: &[&str] = &["mandatory_custom_claims", "non_mandatory_custom_claims"];
/// Declared key of the rate-limit tier list.
const RATE_LIMITS_KEY: &str = "rate_limits";

/// How nested list elements are paired with previous elements.
#[derive(Debug, Clone, Copy)]
enum ElementMatch {
    /// Pair by list position.
    Position,
    /// Pair by equal value of the named field.
    Field(&'static str),
}

// ============================================================================
// SECTION: Declaration
// ============================================================================

/// Rebuilds a declaration from a remote document.
///
/// `previous` is the last known declaration, or `None` on import. The id
/// comes from the document only; callers supply the addressed id when the
/// document omits it.
///
/// # Errors
///
/// Returns [`MappingError`] when the remote shape cannot be mapped or the
/// asset coordinates are unknown.
pub fn declaration_from_remote(
    document: &RemotePolicyDocument,
    scope: PolicyScope,
    previous: Option<&PolicyDeclaration>,
) -> Result<PolicyDeclaration, MappingError> {
    let asset = AssetCoordinates {
        asset_group_id: coordinate(
            "asset_group_id",
            document.group_id.as_deref(),
            previous.map(|p| p.asset.asset_group_id.as_str()),
        )?,
        asset_id: coordinate(
            "asset_id",
            document.asset_id.as_deref(),
            previous.map(|p| p.asset.asset_id.as_str()),
        )?,
        asset_version: coordinate(
            "asset_version",
            document.asset_version.as_deref(),
            previous.map(|p| p.asset.asset_version.as_str()),
        )?,
    };
    let kind = PolicyKind::from_asset(&asset.asset_group_id, &asset.asset_id);
    let configuration = parse_configuration(
        kind,
        &document.configuration_data,
        previous.map(|p| &p.configuration),
    )?;
    let audit = document.audit.as_ref().map(|audit| PolicyAudit {
        created_at: audit.created.as_ref().and_then(|stamp| stamp.date.clone()),
        updated_at: audit.updated.as_ref().and_then(|stamp| stamp.date.clone()),
    });
    Ok(PolicyDeclaration {
        scope,
        asset,
        configuration,
        pointcut_conditions: decode_pointcuts(document.pointcut_data.as_deref()),
        disabled: document.disabled,
        id: document.id.clone(),
        remote: RemoteAttributes {
            order: document.order,
            policy_template_id: document.policy_template_id.clone(),
            master_organization_id: document.master_organization_id.clone(),
            audit,
        },
    })
}

/// Picks a remote coordinate, falling back to the previous declaration.
fn coordinate(
    attribute: &str,
    remote: Option<&str>,
    previous: Option<&str>,
) -> Result<String, MappingError> {
    [remote, previous]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| MappingError::new(attribute, "missing from remote policy document"))
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Parses remote `configurationData` for `kind`, merged over `previous`.
///
/// A previous configuration of a different kind is ignored.
///
/// # Errors
///
/// Returns [`MappingError`] when the remote shape does not match the kind.
pub fn parse_configuration(
    kind: PolicyKind,
    remote: &Map<String, Value>,
    previous: Option<&PolicyConfiguration>,
) -> Result<PolicyConfiguration, MappingError> {
    let previous = previous.filter(|config| config.kind() == kind);
    Ok(match kind {
        PolicyKind::ClientIdEnforcement => {
            let previous = match previous {
                Some(PolicyConfiguration::ClientIdEnforcement(config)) => Some(config),
                _ => None,
            };
            PolicyConfiguration::ClientIdEnforcement(parse_client_id_enforcement(remote, previous)?)
        }
        PolicyKind::JwtValidation => {
            let previous = match previous {
                Some(PolicyConfiguration::JwtValidation(config)) => Some(config),
                _ => None,
            };
            PolicyConfiguration::JwtValidation(parse_jwt_validation(remote, previous)?)
        }
        PolicyKind::MessageLogging => {
            let previous = match previous {
                Some(PolicyConfiguration::MessageLogging(config)) => Some(config),
                _ => None,
            };
            PolicyConfiguration::MessageLogging(parse_message_logging(remote, previous)?)
        }
        PolicyKind::RateLimiting => {
            let previous = match previous {
                Some(PolicyConfiguration::RateLimiting(config)) => Some(config),
                _ => None,
            };
            PolicyConfiguration::RateLimiting(parse_rate_limiting(remote, previous)?)
        }
        PolicyKind::Custom => {
            let empty = Map::new();
            let declared = match previous {
                Some(PolicyConfiguration::Custom(config)) => &config.configuration_data,
                _ => &empty,
            };
            PolicyConfiguration::Custom(CustomPolicyConfig::new(merge_shallow(declared, remote)))
        }
    })
}

/// Parses client-id enforcement configuration.
///
/// In header mode both expressions are restored from `previous` so the fixed
/// header expression never reaches local state.
///
/// # Errors
///
/// Returns [`MappingError`] when the remote shape does not match.
pub fn parse_client_id_enforcement(
    remote: &Map<String, Value>,
    previous: Option<&ClientIdEnforcementConfig>,
) -> Result<ClientIdEnforcementConfig, MappingError> {
    let merged = overlay_flat(base_map(previous)?, remote, &[]);
    let mut config: ClientIdEnforcementConfig = typed_from_local(merged)?;
    if config.uses_basic_header() {
        config.client_id_expression = previous.and_then(|p| p.client_id_expression.clone());
        config.client_secret_expression = previous.and_then(|p| p.client_secret_expression.clone());
    }
    Ok(config)
}

/// Parses JWT validation configuration.
///
/// # Errors
///
/// Returns [`MappingError`] when the remote shape does not match.
pub fn parse_jwt_validation(
    remote: &Map<String, Value>,
    previous: Option<&JwtValidationConfig>,
) -> Result<JwtValidationConfig, MappingError> {
    let base = base_map(previous)?;
    let mut merged = overlay_flat(base.clone(), remote, CLAIM_LIST_KEYS);
    for key in CLAIM_LIST_KEYS {
        if let Some(items) = remote_value(remote, key) {
            let list = merge_list(key, items, base.get(*key), ElementMatch::Field("key"))?;
            merged.insert((*key).to_string(), list);
        }
    }
    typed_from_local(merged)
}

/// Parses rate limiting configuration.
///
/// # Errors
///
/// Returns [`MappingError`] when the remote shape does not match.
pub fn parse_rate_limiting(
    remote: &Map<String, Value>,
    previous: Option<&RateLimitingConfig>,
) -> Result<RateLimitingConfig, MappingError> {
    let base = base_map(previous)?;
    let mut merged = overlay_flat(base.clone(), remote, &[RATE_LIMITS_KEY]);
    if let Some(items) = remote_value(remote, RATE_LIMITS_KEY) {
        let list = merge_list(RATE_LIMITS_KEY, items, base.get(RATE_LIMITS_KEY), ElementMatch::Position)?;
        merged.insert(RATE_LIMITS_KEY.to_string(), list);
    }
    typed_from_local(merged)
}

/// Parses message logging configuration.
///
/// # Errors
///
/// Returns [`MappingError`] when an entry lacks a name or has a bad shape.
pub fn parse_message_logging(
    remote: &Map<String, Value>,
    previous: Option<&MessageLoggingConfig>,
) -> Result<MessageLoggingConfig, MappingError> {
    let items = match remote.get(LOGGING_CONFIGURATION_KEY) {
        None | Some(Value::Null) => return Ok(previous.cloned().unwrap_or_default()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(MappingError::new(
                "configuration.logging_configuration",
                format!("expected an array, got {}", json_type_name(other)),
            ));
        }
    };
    let mut rules = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let attribute = format!("configuration.logging_configuration[{index}]");
        let name = item
            .get(ITEM_NAME_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| MappingError::new(&attribute, "logging rule has no itemName"))?;
        let data = match item.get(ITEM_DATA_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(data)) => to_local_object(data),
            Some(other) => {
                return Err(MappingError::new(
                    &attribute,
                    format!("itemData must be an object, got {}", json_type_name(other)),
                ));
            }
        };
        let prior = previous.and_then(|config| {
            config.logging_configuration.iter().find(|rule| rule.name == name)
        });
        let mut merged = match prior {
            Some(rule) => local_map_of(rule)?,
            None => Map::new(),
        };
        overlay_non_null(&mut merged, data);
        merged.insert("name".to_string(), Value::String(name.to_string()));
        let rule: LoggingRule = typed_from_local(merged)
            .map_err(|err| MappingError::new(&attribute, err.message))?;
        rules.push(rule);
    }
    Ok(MessageLoggingConfig {
        logging_configuration: rules,
    })
}

// ============================================================================
// SECTION: JSON Merge
// ============================================================================

/// Shallow-merges `remote` over `declared`; remote wins on collisions.
///
/// Declared key order is kept; remote-only keys are appended.
#[must_use]
pub fn merge_shallow(declared: &Map<String, Value>, remote: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = declared.clone();
    for (key, value) in remote {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the previous configuration as a declared object, or empty.
fn base_map<T: serde::Serialize>(previous: Option<&T>) -> Result<Map<String, Value>, MappingError> {
    previous.map_or_else(|| Ok(Map::new()), local_map_of)
}

/// Lays non-null remote fields over `base`, skipping the `nested` declared keys.
fn overlay_flat(
    mut base: Map<String, Value>,
    remote: &Map<String, Value>,
    nested: &[&str],
) -> Map<String, Value> {
    for (key, value) in remote {
        let local = to_local_key(key);
        if value.is_null() || nested.contains(&local.as_str()) {
            continue;
        }
        base.insert(local, value.clone());
    }
    base
}

/// Lays non-null fields of `overlay` over `base`.
fn overlay_non_null(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        if !value.is_null() {
            base.insert(key, value);
        }
    }
}

/// Returns the non-null remote value for a declared key.
fn remote_value<'a>(remote: &'a Map<String, Value>, local_key: &str) -> Option<&'a Value> {
    remote.iter().find(|(key, _)| to_local_key(key) == local_key).map(|(_, value)| value).filter(
        |value| !value.is_null(),
    )
}

/// Merges a remote list over previous elements, converting each element.
fn merge_list(
    field: &str,
    remote: &Value,
    previous: Option<&Value>,
    matcher: ElementMatch,
) -> Result<Value, MappingError> {
    let attribute = format!("configuration.{field}");
    let Value::Array(items) = remote else {
        return Err(MappingError::new(
            attribute,
            format!("expected an array, got {}", json_type_name(remote)),
        ));
    };
    let prior_items = previous.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    let mut merged_items = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(remote_item) = item else {
            return Err(MappingError::new(
                format!("{attribute}[{index}]"),
                format!("expected an object, got {}", json_type_name(item)),
            ));
        };
        let local = to_local_object(remote_item);
        let prior = match matcher {
            ElementMatch::Position => prior_items.get(index),
            ElementMatch::Field(name) => local
                .get(name)
                .and_then(|wanted| prior_items.iter().find(|p| p.get(name) == Some(wanted))),
        };
        let mut merged = prior.and_then(Value::as_object).cloned().unwrap_or_default();
        overlay_non_null(&mut merged, local);
        merged_items.push(Value::Object(merged));
    }
    Ok(Value::Array(merged_items))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
