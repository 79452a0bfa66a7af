// crates/apim-policy-core/src/configuration/custom.rs
// ============================================================================
// Module: Custom Policy Configuration
// Description: Opaque JSON object configuration for arbitrary templates.
// Purpose: Carry an ordered document sent to the platform verbatim.
// Dependencies: serde_json
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::configuration::CONFIGURATION_ATTRIBUTE;
use crate::configuration::json_type_name;
use crate::error::MappingError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Custom policy configuration.
///
/// # Invariants
/// - Key order is preserved exactly as declared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomPolicyConfig {
    /// Configuration document, sent without key conversion.
    pub configuration_data: Map<String, Value>,
}

impl CustomPolicyConfig {
    /// Wraps a JSON object document.
    #[must_use]
    pub const fn new(configuration_data: Map<String, Value>) -> Self {
        Self {
            configuration_data,
        }
    }

    /// Parses declared JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the text is not a JSON object.
    pub fn from_json_text(text: &str) -> Result<Self, MappingError> {
        let value: Value = serde_json::from_str(text).map_err(|err| {
            MappingError::new(
                CONFIGURATION_ATTRIBUTE,
                format!("configuration_data is not valid JSON: {err}"),
            )
        })?;
        Self::from_value(value)
    }

    /// Accepts a JSON value that must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(MappingError::new(
                CONFIGURATION_ATTRIBUTE,
                format!("configuration_data must be a JSON object, got {}", json_type_name(&other)),
            )),
        }
    }

    /// Renders the document as compact JSON text.
    #[must_use]
    pub fn to_json_text(&self) -> String {
        Value::Object(self.configuration_data.clone()).to_string()
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
    fn parses_objects_and_keeps_order() {
        let config = CustomPolicyConfig::from_json_text(r#"{"zeta":1,"alpha":{"b":2}}"#).unwrap();
        let keys: Vec<&String> = config.configuration_data.keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(config.to_json_text(), r#"{"zeta":1,"alpha":{"b":2}}"#);
    }

    #[test]
    fn rejects_non_objects_and_invalid_text() {
        assert!(CustomPolicyConfig::from_json_text("[1,2]").is_err());
        let err = CustomPolicyConfig::from_json_text("{not json").unwrap_err();
        assert!(err.message.contains("not valid JSON"));
    }
}
