// crates/apim-policy-core/src/configuration/mod.rs
// ============================================================================
// Module: Policy Configuration
// Description: Closed set of typed policy configurations plus a custom case.
// Purpose: Model per-asset configuration in its declared (snake_case) form.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`PolicyConfiguration`] is a closed tagged variant with one case per known
//! policy template and a [`PolicyConfiguration::Custom`] case carrying an
//! ordered JSON object. The variant is selected from the asset coordinates via
//! [`PolicyKind::from_asset`].
//!
//! Typed configurations serialize to their declared snake_case form. Remote
//! key conversion lives in [`crate::builders`] and [`crate::parsers`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::error::MappingError;

mod client_id_enforcement;
mod custom;
mod jwt_validation;
mod message_logging;
mod rate_limiting;

pub use client_id_enforcement::ClientIdEnforcementConfig;
pub use client_id_enforcement::CredentialsOrigin;
pub use client_id_enforcement::HTTP_BASIC_CLIENT_ID_EXPRESSION;
pub use custom::CustomPolicyConfig;
pub use jwt_validation::CustomClaim;
pub use jwt_validation::JwtKeyOrigin;
pub use jwt_validation::JwtOrigin;
pub use jwt_validation::JwtValidationConfig;
pub use jwt_validation::SIGNING_KEY_LENGTHS;
pub use jwt_validation::SigningMethod;
pub use message_logging::LogLevel;
pub use message_logging::LoggingRule;
pub use message_logging::MessageLoggingConfig;
pub use rate_limiting::RateLimitTier;
pub use rate_limiting::RateLimitingConfig;

// ============================================================================
// SECTION: Asset Coordinates
// ============================================================================

/// Exchange group hosting the platform's built-in policy templates.
pub const PUBLIC_POLICY_GROUP_ID: &str = "68ef9520-24e9-4cf2-b2f5-620025690913";
/// Asset id of the client-id enforcement template.
pub const CLIENT_ID_ENFORCEMENT_ASSET_ID: &str = "client-id-enforcement";
/// Asset id of the JWT validation template.
pub const JWT_VALIDATION_ASSET_ID: &str = "jwt-validation";
/// Asset id of the message logging template.
pub const MESSAGE_LOGGING_ASSET_ID: &str = "message-logging";
/// Asset id of the rate limiting template.
pub const RATE_LIMITING_ASSET_ID: &str = "rate-limiting";

// ============================================================================
// SECTION: Kind
// ============================================================================

/// Policy configuration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Client-id enforcement.
    ClientIdEnforcement,
    /// JWT validation.
    JwtValidation,
    /// Message logging.
    MessageLogging,
    /// Rate limiting.
    RateLimiting,
    /// Any other template; configuration is an opaque JSON object.
    Custom,
}

impl PolicyKind {
    /// Resolves the kind from policy template coordinates.
    #[must_use]
    pub fn from_asset(group_id: &str, asset_id: &str) -> Self {
        if group_id != PUBLIC_POLICY_GROUP_ID {
            return Self::Custom;
        }
        match asset_id {
            CLIENT_ID_ENFORCEMENT_ASSET_ID => Self::ClientIdEnforcement,
            JWT_VALIDATION_ASSET_ID => Self::JwtValidation,
            MESSAGE_LOGGING_ASSET_ID => Self::MessageLogging,
            RATE_LIMITING_ASSET_ID => Self::RateLimiting,
            _ => Self::Custom,
        }
    }

    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientIdEnforcement => "client_id_enforcement",
            Self::JwtValidation => "jwt_validation",
            Self::MessageLogging => "message_logging",
            Self::RateLimiting => "rate_limiting",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Declared policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyConfiguration {
    /// Client-id enforcement configuration.
    ClientIdEnforcement(ClientIdEnforcementConfig),
    /// JWT validation configuration.
    JwtValidation(JwtValidationConfig),
    /// Message logging configuration.
    MessageLogging(MessageLoggingConfig),
    /// Rate limiting configuration.
    RateLimiting(RateLimitingConfig),
    /// Custom policy configuration.
    Custom(CustomPolicyConfig),
}

impl PolicyConfiguration {
    /// Returns the kind of this configuration.
    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        match self {
            Self::ClientIdEnforcement(_) => PolicyKind::ClientIdEnforcement,
            Self::JwtValidation(_) => PolicyKind::JwtValidation,
            Self::MessageLogging(_) => PolicyKind::MessageLogging,
            Self::RateLimiting(_) => PolicyKind::RateLimiting,
            Self::Custom(_) => PolicyKind::Custom,
        }
    }

    /// Returns the configuration as a declared snake_case object.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the configuration cannot be serialized.
    pub fn to_local_map(&self) -> Result<Map<String, Value>, MappingError> {
        match self {
            Self::ClientIdEnforcement(config) => local_map_of(config),
            Self::JwtValidation(config) => local_map_of(config),
            Self::MessageLogging(config) => local_map_of(config),
            Self::RateLimiting(config) => local_map_of(config),
            Self::Custom(config) => Ok(config.configuration_data.clone()),
        }
    }

    /// Builds a configuration of `kind` from a declared snake_case object.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the object does not match the kind's shape.
    pub fn from_local_map(
        kind: PolicyKind,
        local: Map<String, Value>,
    ) -> Result<Self, MappingError> {
        Ok(match kind {
            PolicyKind::ClientIdEnforcement => Self::ClientIdEnforcement(typed_from_local(local)?),
            PolicyKind::JwtValidation => Self::JwtValidation(typed_from_local(local)?),
            PolicyKind::MessageLogging => Self::MessageLogging(typed_from_local(local)?),
            PolicyKind::RateLimiting => Self::RateLimiting(typed_from_local(local)?),
            PolicyKind::Custom => Self::Custom(CustomPolicyConfig::new(local)),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Attribute path used for configuration mapping failures.
pub(crate) const CONFIGURATION_ATTRIBUTE: &str = "configuration";

/// Serializes a typed configuration into a snake_case object.
pub(crate) fn local_map_of<T: Serialize>(value: &T) -> Result<Map<String, Value>, MappingError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(MappingError::new(
            CONFIGURATION_ATTRIBUTE,
            format!("expected an object, got {}", json_type_name(&other)),
        )),
        Err(err) => Err(MappingError::new(CONFIGURATION_ATTRIBUTE, err.to_string())),
    }
}

/// Deserializes a typed configuration from a snake_case object.
pub(crate) fn typed_from_local<T: DeserializeOwned>(
    local: Map<String, Value>,
) -> Result<T, MappingError> {
    serde_json::from_value(Value::Object(local))
        .map_err(|err| MappingError::new(CONFIGURATION_ATTRIBUTE, err.to_string()))
}

/// Returns a short JSON type label for error messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
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

    use serde_json::json;

    use super::*;

    #[test]
    fn kind_resolves_from_public_group_only() {
        assert_eq!(
            PolicyKind::from_asset(PUBLIC_POLICY_GROUP_ID, "rate-limiting"),
            PolicyKind::RateLimiting
        );
        assert_eq!(
            PolicyKind::from_asset(PUBLIC_POLICY_GROUP_ID, "jwt-validation"),
            PolicyKind::JwtValidation
        );
        assert_eq!(PolicyKind::from_asset("my-org", "rate-limiting"), PolicyKind::Custom);
        assert_eq!(
            PolicyKind::from_asset(PUBLIC_POLICY_GROUP_ID, "header-injection"),
            PolicyKind::Custom
        );
    }

    #[test]
    fn local_map_round_trips_typed_configuration() {
        let config = PolicyConfiguration::RateLimiting(RateLimitingConfig {
            rate_limits: vec![RateLimitTier {
                maximum_requests: 10,
                time_period_in_milliseconds: 1000,
            }],
            ..RateLimitingConfig::default()
        });
        let local = config.to_local_map().unwrap();
        assert_eq!(local.get("clusterizable"), Some(&json!(true)));
        let parsed = PolicyConfiguration::from_local_map(PolicyKind::RateLimiting, local).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn from_local_map_reports_shape_errors() {
        let local = json!({"rate_limits": "many"}).as_object().unwrap().clone();
        let err = PolicyConfiguration::from_local_map(PolicyKind::RateLimiting, local).unwrap_err();
        assert_eq!(err.field, "configuration");
    }
}
