// crates/apim-policy-core/src/validation.rs
// ============================================================================
// Module: Policy Validation
// Description: Cross-field conditional rules evaluated before submission.
// Purpose: Reject invalid declarations locally with every failure reported.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation runs once per create or update, before any network call. Every
//! rule is evaluated and all failures are collected so users see them
//! together. Strings that are empty after trimming count as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::configuration::ClientIdEnforcementConfig;
use crate::configuration::CredentialsOrigin;
use crate::configuration::JwtKeyOrigin;
use crate::configuration::JwtOrigin;
use crate::configuration::JwtValidationConfig;
use crate::configuration::MessageLoggingConfig;
use crate::configuration::PolicyConfiguration;
use crate::configuration::RateLimitingConfig;
use crate::configuration::SIGNING_KEY_LENGTHS;
use crate::configuration::SigningMethod;
use crate::model::PolicyDeclaration;
use crate::pointcut::PointcutCondition;
use crate::pointcut::SUPPORTED_HTTP_METHODS;
use crate::pointcut::is_supported_method;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Single field validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{attribute}: {message}")]
pub struct FieldError {
    /// Attribute path (e.g. `configuration.jwks_url`).
    pub attribute: String,
    /// Failure description.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

/// Collected validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a failure.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Returns true when no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over failures.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Returns true when a failure is attributed to `attribute`.
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.0.iter().any(|error| error.attribute == attribute)
    }

    /// Converts the collection into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` when any failure was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Records a conditional-required failure.
    fn required(&mut self, attribute: &str, reason: &str) {
        self.push(FieldError::new(attribute, format!("required when {reason}")));
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Validates a declaration before create or update.
///
/// # Errors
///
/// Returns every [`FieldError`] found.
pub fn validate_declaration(declaration: &PolicyDeclaration) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let identity = [
        ("org_id", &declaration.scope.org_id),
        ("env_id", &declaration.scope.env_id),
        ("api_instance_id", &declaration.scope.api_instance_id),
        ("asset_group_id", &declaration.asset.asset_group_id),
        ("asset_id", &declaration.asset.asset_id),
        ("asset_version", &declaration.asset.asset_version),
    ];
    for (attribute, value) in identity {
        if is_blank(value) {
            errors.push(FieldError::new(attribute, "must not be empty"));
        }
    }
    validate_pointcuts(&declaration.pointcut_conditions, &mut errors);
    validate_configuration(&declaration.configuration, &mut errors);
    errors.into_result()
}

/// Validates a configuration on its own.
pub fn validate_configuration(configuration: &PolicyConfiguration, errors: &mut ValidationErrors) {
    match configuration {
        PolicyConfiguration::ClientIdEnforcement(config) => validate_client_id(config, errors),
        PolicyConfiguration::JwtValidation(config) => validate_jwt(config, errors),
        PolicyConfiguration::MessageLogging(config) => validate_logging(config, errors),
        PolicyConfiguration::RateLimiting(config) => validate_rate_limiting(config, errors),
        PolicyConfiguration::Custom(_) => {}
    }
}

// ============================================================================
// SECTION: Pointcuts
// ============================================================================

/// Validates pointcut methods and URI regexes.
fn validate_pointcuts(conditions: &[PointcutCondition], errors: &mut ValidationErrors) {
    for (index, condition) in conditions.iter().enumerate() {
        let prefix = format!("pointcut_conditions[{index}]");
        if condition.http_methods.is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.http_methods"),
                "at least one HTTP method is required",
            ));
        }
        for method in &condition.http_methods {
            if !is_supported_method(method) {
                errors.push(FieldError::new(
                    format!("{prefix}.http_methods"),
                    format!(
                        "unsupported HTTP method \"{method}\"; expected one of {}",
                        SUPPORTED_HTTP_METHODS.join(", ")
                    ),
                ));
            }
        }
        if is_blank(&condition.uri_template_regex) {
            errors.push(FieldError::new(format!("{prefix}.uri_template_regex"), "must not be empty"));
        }
    }
}

// ============================================================================
// SECTION: Per-Type Rules
// ============================================================================

/// Client-id enforcement: expressions are required in custom expression mode.
fn validate_client_id(config: &ClientIdEnforcementConfig, errors: &mut ValidationErrors) {
    if config.credentials_origin_has_http_basic_authentication_header
        != CredentialsOrigin::CustomExpression
    {
        return;
    }
    let reason = "credentials_origin_has_http_basic_authentication_header is customExpression";
    if is_absent(config.client_id_expression.as_deref()) {
        errors.required("configuration.client_id_expression", reason);
    }
    if is_absent(config.client_secret_expression.as_deref()) {
        errors.required("configuration.client_secret_expression", reason);
    }
}

/// JWT validation conditional rules.
fn validate_jwt(config: &JwtValidationConfig, errors: &mut ValidationErrors) {
    if config.jwt_origin == JwtOrigin::CustomExpression && is_absent(config.jwt_expression.as_deref())
    {
        errors.required("configuration.jwt_expression", "jwt_origin is customExpression");
    }
    match config.jwt_key_origin {
        JwtKeyOrigin::Jwks => {
            let reason = "jwt_key_origin is jwks";
            if is_absent(config.jwks_url.as_deref()) {
                errors.required("configuration.jwks_url", reason);
            }
            if config.jwks_service_time_to_live.is_none() {
                errors.required("configuration.jwks_service_time_to_live", reason);
            }
            if config.jwks_service_connection_timeout.is_none() {
                errors.required("configuration.jwks_service_connection_timeout", reason);
            }
        }
        JwtKeyOrigin::Text => {
            if is_absent(config.text_key.as_deref()) {
                errors.required("configuration.text_key", "jwt_key_origin is text");
            }
        }
    }
    if !config.skip_client_id_validation && is_absent(config.client_id_expression.as_deref()) {
        errors.required("configuration.client_id_expression", "skip_client_id_validation is false");
    }
    if config.validate_aud_claim && is_absent(config.supported_audiences.as_deref()) {
        errors.required("configuration.supported_audiences", "validate_aud_claim is true");
    }
    if config.validate_custom_claim
        && config.mandatory_custom_claims.is_empty()
        && config.non_mandatory_custom_claims.is_empty()
    {
        errors.push(FieldError::new(
            "configuration.mandatory_custom_claims",
            "at least one custom claim is required when validate_custom_claim is true",
        ));
    }
    if config.signing_method != SigningMethod::Unsigned
        && !SIGNING_KEY_LENGTHS.contains(&config.signing_key_length)
    {
        errors.push(FieldError::new(
            "configuration.signing_key_length",
            format!("must be one of 256, 384, 512; got {}", config.signing_key_length),
        ));
    }
    for (field, claims) in [
        ("mandatory_custom_claims", &config.mandatory_custom_claims),
        ("non_mandatory_custom_claims", &config.non_mandatory_custom_claims),
    ] {
        for (index, claim) in claims.iter().enumerate() {
            if is_blank(&claim.key) {
                errors.push(FieldError::new(
                    format!("configuration.{field}[{index}].key"),
                    "must not be empty",
                ));
            }
        }
    }
}

/// Message logging: non-empty, uniquely named rules.
fn validate_logging(config: &MessageLoggingConfig, errors: &mut ValidationErrors) {
    if config.logging_configuration.is_empty() {
        errors.push(FieldError::new(
            "configuration.logging_configuration",
            "at least one logging rule is required",
        ));
    }
    let mut seen = BTreeSet::new();
    for (index, rule) in config.logging_configuration.iter().enumerate() {
        let prefix = format!("configuration.logging_configuration[{index}]");
        if is_blank(&rule.name) {
            errors.push(FieldError::new(format!("{prefix}.name"), "must not be empty"));
        } else if !seen.insert(rule.name.as_str()) {
            errors.push(FieldError::new(
                format!("{prefix}.name"),
                format!("duplicate logging rule name \"{}\"", rule.name),
            ));
        }
        if is_blank(&rule.message) {
            errors.push(FieldError::new(format!("{prefix}.message"), "must not be empty"));
        }
    }
}

/// Rate limiting: at least one positive tier.
fn validate_rate_limiting(config: &RateLimitingConfig, errors: &mut ValidationErrors) {
    if config.rate_limits.is_empty() {
        errors.push(FieldError::new(
            "configuration.rate_limits",
            "at least one rate limit tier is required",
        ));
    }
    for (index, tier) in config.rate_limits.iter().enumerate() {
        let prefix = format!("configuration.rate_limits[{index}]");
        if tier.maximum_requests == 0 {
            errors.push(FieldError::new(format!("{prefix}.maximum_requests"), "must be at least 1"));
        }
        if tier.time_period_in_milliseconds == 0 {
            errors.push(FieldError::new(
                format!("{prefix}.time_period_in_milliseconds"),
                "must be at least 1",
            ));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for empty or whitespace-only strings.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns true for missing or blank optional strings.
fn is_absent(value: Option<&str>) -> bool {
    value.is_none_or(is_blank)
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
    use crate::configuration::CustomClaim;
    use crate::configuration::LoggingRule;
    use crate::configuration::RateLimitTier;

    fn jwt_errors(config: JwtValidationConfig) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_jwt(&config, &mut errors);
        errors
    }

    fn text_key_config() -> JwtValidationConfig {
        JwtValidationConfig {
            text_key: Some("secret".to_string()),
            client_id_expression: Some("#[vars.claimSet.client_id]".to_string()),
            ..JwtValidationConfig::default()
        }
    }

    #[test]
    fn client_id_header_mode_requires_nothing() {
        let mut errors = ValidationErrors::new();
        validate_client_id(&ClientIdEnforcementConfig::default(), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn client_id_custom_mode_requires_both_expressions() {
        let config = ClientIdEnforcementConfig {
            credentials_origin_has_http_basic_authentication_header:
                CredentialsOrigin::CustomExpression,
            client_id_expression: Some("#[attributes.headers['id']]".to_string()),
            client_secret_expression: Some("   ".to_string()),
        };
        let mut errors = ValidationErrors::new();
        validate_client_id(&config, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("configuration.client_secret_expression"));
    }

    #[test]
    fn jwks_origin_requires_all_three_fields() {
        let errors = jwt_errors(JwtValidationConfig {
            jwt_key_origin: JwtKeyOrigin::Jwks,
            jwks_url: Some("https://idp.example.com/jwks".to_string()),
            ..text_key_config()
        });
        assert_eq!(errors.len(), 2);
        assert!(errors.contains("configuration.jwks_service_time_to_live"));
        assert!(errors.contains("configuration.jwks_service_connection_timeout"));
    }

    #[test]
    fn aud_claim_requires_supported_audiences() {
        let errors = jwt_errors(JwtValidationConfig {
            validate_aud_claim: true,
            ..text_key_config()
        });
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("configuration.supported_audiences"));
    }

    #[test]
    fn jwt_collects_all_failures_together() {
        let errors = jwt_errors(JwtValidationConfig {
            jwt_origin: JwtOrigin::CustomExpression,
            validate_custom_claim: true,
            signing_key_length: 128,
            ..JwtValidationConfig::default()
        });
        assert!(errors.contains("configuration.jwt_expression"));
        assert!(errors.contains("configuration.text_key"));
        assert!(errors.contains("configuration.client_id_expression"));
        assert!(errors.contains("configuration.mandatory_custom_claims"));
        assert!(errors.contains("configuration.signing_key_length"));
    }

    #[test]
    fn unsigned_tokens_skip_key_length_check() {
        let errors = jwt_errors(JwtValidationConfig {
            signing_method: SigningMethod::Unsigned,
            signing_key_length: 0,
            validate_custom_claim: true,
            non_mandatory_custom_claims: vec![CustomClaim {
                key: "scope".to_string(),
                value: "read".to_string(),
            }],
            ..text_key_config()
        });
        assert!(errors.is_empty(), "{errors}");
    }

    #[test]
    fn logging_rules_need_unique_names() {
        let rule = LoggingRule {
            name: "audit".to_string(),
            message: "#[attributes.method]".to_string(),
            ..LoggingRule::default()
        };
        let mut errors = ValidationErrors::new();
        validate_logging(
            &MessageLoggingConfig {
                logging_configuration: vec![rule.clone(), rule],
            },
            &mut errors,
        );
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("configuration.logging_configuration[1].name"));
    }

    #[test]
    fn rate_limit_tiers_must_be_positive() {
        let mut errors = ValidationErrors::new();
        validate_rate_limiting(
            &RateLimitingConfig {
                rate_limits: vec![RateLimitTier {
                    maximum_requests: 0,
                    time_period_in_milliseconds: 1000,
                }],
                ..RateLimitingConfig::default()
            },
            &mut errors,
        );
        assert!(errors.contains("configuration.rate_limits[0].maximum_requests"));
        let mut empty = ValidationErrors::new();
        validate_rate_limiting(&RateLimitingConfig::default(), &mut empty);
        assert!(empty.contains("configuration.rate_limits"));
    }

    #[test]
    fn pointcuts_require_supported_methods_and_regex() {
        let mut errors = ValidationErrors::new();
        validate_pointcuts(
            &[
                PointcutCondition::new(Vec::<String>::new(), "/a"),
                PointcutCondition::new(["FETCH"], " "),
            ],
            &mut errors,
        );
        assert!(errors.contains("pointcut_conditions[0].http_methods"));
        assert!(errors.contains("pointcut_conditions[1].http_methods"));
        assert!(errors.contains("pointcut_conditions[1].uri_template_regex"));
    }
}
