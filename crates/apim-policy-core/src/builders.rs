// crates/apim-policy-core/src/builders.rs
// ============================================================================
// Module: Policy Configuration Builders
// Description: Assemble remote configuration documents and request bodies.
// Purpose: Translate declared configuration into the platform's wire form.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! One builder per policy type turns the declared configuration into the
//! remote `configurationData` object:
//! - flat types copy each present field through the codec;
//! - nested list elements (rate-limit tiers, custom claims) are converted per
//!   element;
//! - message logging rules become `{itemName, itemData}` pairs;
//! - custom policies are sent verbatim.
//!
//! Absent optional fields are omitted rather than sent as `null`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::codec::to_remote_key;
use crate::codec::to_remote_object;
use crate::configuration::ClientIdEnforcementConfig;
use crate::configuration::HTTP_BASIC_CLIENT_ID_EXPRESSION;
use crate::configuration::JwtValidationConfig;
use crate::configuration::LoggingRule;
use crate::configuration::MessageLoggingConfig;
use crate::configuration::PolicyConfiguration;
use crate::configuration::RateLimitingConfig;
use crate::configuration::local_map_of;
use crate::document::CreatePolicyBody;
use crate::document::PatchPolicyBody;
use crate::error::MappingError;
use crate::model::PolicyDeclaration;
use crate::pointcut::encode_pointcuts;

// ============================================================================
// SECTION: Remote Keys
// ============================================================================

/// Remote key holding the list of logging rules.
pub(crate) const LOGGING_CONFIGURATION_KEY: &str = "loggingConfiguration";
/// Remote key holding a logging rule name.
pub(crate) const ITEM_NAME_KEY: &str = "itemName";
/// Remote key holding a logging rule body.
pub(crate) const ITEM_DATA_KEY: &str = "itemData";

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// Builds the body that attaches a new policy.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_create_body(declaration: &PolicyDeclaration) -> Result<CreatePolicyBody, MappingError> {
    Ok(CreatePolicyBody {
        configuration_data: build_configuration_data(&declaration.configuration)?,
        pointcut_data: encode_pointcuts(&declaration.pointcut_conditions),
        group_id: declaration.asset.asset_group_id.clone(),
        asset_id: declaration.asset.asset_id.clone(),
        asset_version: declaration.asset.asset_version.clone(),
    })
}

/// Builds the body that updates an attached policy.
///
/// `pointcut_data` is `None` (serialized as `null`) when no conditions are
/// declared so that previously attached conditions are cleared.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_patch_body(declaration: &PolicyDeclaration) -> Result<PatchPolicyBody, MappingError> {
    Ok(PatchPolicyBody {
        configuration_data: build_configuration_data(&declaration.configuration)?,
        pointcut_data: encode_pointcuts(&declaration.pointcut_conditions),
    })
}

// ============================================================================
// SECTION: Configuration Data
// ============================================================================

/// Builds the remote `configurationData` object.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_configuration_data(
    configuration: &PolicyConfiguration,
) -> Result<Map<String, Value>, MappingError> {
    match configuration {
        PolicyConfiguration::ClientIdEnforcement(config) => build_client_id_enforcement(config),
        PolicyConfiguration::JwtValidation(config) => build_jwt_validation(config),
        PolicyConfiguration::MessageLogging(config) => Ok(build_message_logging(config)),
        PolicyConfiguration::RateLimiting(config) => build_rate_limiting(config),
        PolicyConfiguration::Custom(config) => Ok(config.configuration_data.clone()),
    }
}

/// Builds client-id enforcement configuration.
///
/// In header mode the client id expression is fixed to the basic-auth header
/// and no secret expression is sent.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_client_id_enforcement(
    config: &ClientIdEnforcementConfig,
) -> Result<Map<String, Value>, MappingError> {
    let mut remote = flat_to_remote(&local_map_of(config)?);
    if config.uses_basic_header() {
        remote.insert(
            to_remote_key("client_id_expression"),
            Value::String(HTTP_BASIC_CLIENT_ID_EXPRESSION.to_string()),
        );
        remote.remove(&to_remote_key("client_secret_expression"));
    }
    Ok(remote)
}

/// Builds JWT validation configuration.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_jwt_validation(
    config: &JwtValidationConfig,
) -> Result<Map<String, Value>, MappingError> {
    Ok(flat_to_remote(&local_map_of(config)?))
}

/// Builds rate limiting configuration.
///
/// # Errors
///
/// Returns [`MappingError`] when the configuration cannot be serialized.
pub fn build_rate_limiting(
    config: &RateLimitingConfig,
) -> Result<Map<String, Value>, MappingError> {
    Ok(flat_to_remote(&local_map_of(config)?))
}

/// Builds message logging configuration.
#[must_use]
pub fn build_message_logging(config: &MessageLoggingConfig) -> Map<String, Value> {
    let items = config.logging_configuration.iter().map(build_logging_item).collect();
    let mut remote = Map::new();
    remote.insert(LOGGING_CONFIGURATION_KEY.to_string(), Value::Array(items));
    remote
}

/// Builds a single `{itemName, itemData}` logging entry.
fn build_logging_item(rule: &LoggingRule) -> Value {
    let mut data = Map::new();
    data.insert("message".to_string(), Value::String(rule.message.clone()));
    if let Some(conditional) = non_empty(rule.conditional.as_deref()) {
        data.insert("conditional".to_string(), Value::String(conditional.to_string()));
    }
    if let Some(category) = non_empty(rule.category.as_deref()) {
        data.insert("category".to_string(), Value::String(category.to_string()));
    }
    data.insert("level".to_string(), Value::String(rule.level.as_str().to_string()));
    data.insert(to_remote_key("first_section"), Value::Bool(rule.first_section));
    data.insert(to_remote_key("second_section"), Value::Bool(rule.second_section));

    let mut item = Map::new();
    item.insert(ITEM_NAME_KEY.to_string(), Value::String(rule.name.clone()));
    item.insert(ITEM_DATA_KEY.to_string(), Value::Object(data));
    Value::Object(item)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a declared object to remote form, dropping nulls.
///
/// Arrays of objects are converted per element; other values pass through.
fn flat_to_remote(local: &Map<String, Value>) -> Map<String, Value> {
    let mut remote = Map::new();
    for (key, value) in local {
        let converted = match value {
            Value::Null => continue,
            Value::Array(items) => Value::Array(items.iter().map(element_to_remote).collect()),
            other => other.clone(),
        };
        remote.insert(to_remote_key(key), converted);
    }
    remote
}

/// Converts a nested list element; objects drop nulls and convert keys.
fn element_to_remote(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let present: Map<String, Value> =
                map.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k.clone(), v.clone())).collect();
            Value::Object(to_remote_object(&present))
        }
        other => other.clone(),
    }
}

/// Returns the trimmed-non-empty value, if any.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
