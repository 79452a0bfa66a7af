// crates/apim-policy-core/src/configuration/client_id_enforcement.rs
// ============================================================================
// Module: Client-Id Enforcement Configuration
// Description: Declared configuration for the client-id enforcement template.
// Purpose: Model credential origin and the conditional expression fields.
// Dependencies: serde
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Client id expression the platform evaluates in HTTP basic header mode.
pub const HTTP_BASIC_CLIENT_ID_EXPRESSION: &str = "#[attributes.headers['client_id']]";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Where client credentials are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialsOrigin {
    /// HTTP basic authentication header.
    #[default]
    HttpBasicAuthenticationHeader,
    /// Custom DataWeave expressions.
    CustomExpression,
}

/// Client-id enforcement configuration.
///
/// # Invariants
/// - In [`CredentialsOrigin::CustomExpression`] mode both expressions are set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientIdEnforcementConfig {
    /// Credential origin mode.
    pub credentials_origin_has_http_basic_authentication_header: CredentialsOrigin,
    /// Client id expression (custom expression mode).
    pub client_id_expression: Option<String>,
    /// Client secret expression (custom expression mode).
    pub client_secret_expression: Option<String>,
}

impl ClientIdEnforcementConfig {
    /// Returns true when credentials come from the HTTP basic header.
    #[must_use]
    pub const fn uses_basic_header(&self) -> bool {
        matches!(
            self.credentials_origin_has_http_basic_authentication_header,
            CredentialsOrigin::HttpBasicAuthenticationHeader
        )
    }
}
