// crates/apim-policy-core/src/configuration/jwt_validation.rs
// ============================================================================
// Module: JWT Validation Configuration
// Description: Declared configuration for the JWT validation template.
// Purpose: Model token origin, signing keys, and claim checks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! JWT validation carries a flat set of fields. Several are conditional on
//! mode fields (`jwt_origin`, `jwt_key_origin`, `skip_client_id_validation`,
//! `validate_aud_claim`, `validate_custom_claim`); those rules live in
//! [`crate::validation`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Signing key lengths accepted for signed tokens.
pub const SIGNING_KEY_LENGTHS: &[u32] = &[256, 384, 512];

/// Default signing key length.
const DEFAULT_SIGNING_KEY_LENGTH: u32 = 256;

// ============================================================================
// SECTION: Modes
// ============================================================================

/// Where the token is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JwtOrigin {
    /// `Authorization: Bearer` header.
    #[default]
    HttpBearerAuthenticationHeader,
    /// Custom expression.
    CustomExpression,
}

/// Token signing algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMethod {
    /// Unsigned tokens.
    #[serde(rename = "none")]
    Unsigned,
    /// RSA signatures.
    #[default]
    Rsa,
    /// HMAC signatures.
    Hmac,
    /// ECDSA signatures.
    Es,
}

/// Where the verification key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JwtKeyOrigin {
    /// Inline key text.
    #[default]
    Text,
    /// Remote JWKS endpoint.
    Jwks,
}

/// Custom claim check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomClaim {
    /// Claim name.
    pub key: String,
    /// Expected value or expression.
    pub value: String,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// JWT validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtValidationConfig {
    /// Token origin.
    pub jwt_origin: JwtOrigin,
    /// Token expression (custom expression origin).
    pub jwt_expression: Option<String>,
    /// Signing method.
    pub signing_method: SigningMethod,
    /// Signing key length in bits.
    pub signing_key_length: u32,
    /// Key origin.
    pub jwt_key_origin: JwtKeyOrigin,
    /// Inline key (text key origin).
    pub text_key: Option<String>,
    /// JWKS endpoint (jwks key origin).
    pub jwks_url: Option<String>,
    /// JWKS cache time to live in minutes (jwks key origin).
    pub jwks_service_time_to_live: Option<u64>,
    /// JWKS connection timeout in milliseconds (jwks key origin).
    pub jwks_service_connection_timeout: Option<u64>,
    /// Skip client id validation.
    pub skip_client_id_validation: bool,
    /// Client id expression (required unless skipped).
    pub client_id_expression: Option<String>,
    /// Validate the `aud` claim.
    pub validate_aud_claim: bool,
    /// Require the `aud` claim.
    pub mandatory_aud_claim: bool,
    /// Comma-separated accepted audiences.
    pub supported_audiences: Option<String>,
    /// Require the `exp` claim.
    pub mandatory_exp_claim: bool,
    /// Require the `nbf` claim.
    pub mandatory_nbf_claim: bool,
    /// Validate custom claims.
    pub validate_custom_claim: bool,
    /// Custom claims that must be present.
    pub mandatory_custom_claims: Vec<CustomClaim>,
    /// Custom claims validated when present.
    pub non_mandatory_custom_claims: Vec<CustomClaim>,
    /// Claims propagated to request headers.
    pub claims_to_headers: Vec<String>,
}

impl Default for JwtValidationConfig {
    fn default() -> Self {
        Self {
            jwt_origin: JwtOrigin::default(),
            jwt_expression: None,
            signing_method: SigningMethod::default(),
            signing_key_length: DEFAULT_SIGNING_KEY_LENGTH,
            jwt_key_origin: JwtKeyOrigin::default(),
            text_key: None,
            jwks_url: None,
            jwks_service_time_to_live: None,
            jwks_service_connection_timeout: None,
            skip_client_id_validation: false,
            client_id_expression: None,
            validate_aud_claim: false,
            mandatory_aud_claim: false,
            supported_audiences: None,
            mandatory_exp_claim: false,
            mandatory_nbf_claim: false,
            validate_custom_claim: false,
            mandatory_custom_claims: Vec::new(),
            non_mandatory_custom_claims: Vec::new(),
            claims_to_headers: Vec::new(),
        }
    }
}
