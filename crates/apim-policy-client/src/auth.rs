// crates/apim-policy-client/src/auth.rs
// ============================================================================
// Module: Credential Providers
// Description: Static bearer tokens and OAuth2 client-credentials exchange.
// Purpose: Issue a fresh request context per lifecycle entry point.
// Dependencies: apim-policy-config, apim-policy-core, reqwest, serde, url
// ============================================================================

//! ## Overview
//! Two [`AuthProvider`] implementations back the lifecycle:
//! - [`StaticTokenAuth`] returns a pre-issued token.
//! - [`ClientCredentialsAuth`] exchanges a connected-app id and secret at the
//!   control plane token endpoint on every call. Tokens are never cached.
//!
//! Security posture: secrets and tokens are never rendered by `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use apim_policy_config::ApimPolicyConfig;
use apim_policy_config::HttpConfig;
use apim_policy_config::ResolvedAuth;
use apim_policy_core::AuthError;
use apim_policy_core::AuthProvider;
use apim_policy_core::RequestContext;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::form_urlencoded;

use crate::error::ClientError;
use crate::transport::MAX_RESPONSE_BYTES;
use crate::transport::build_client;
use crate::transport::read_body_limited;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token endpoint path under the control-plane base URL.
pub const TOKEN_PATH: &str = "/accounts/api/v2/oauth2/token";
/// OAuth2 grant type for connected apps.
const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

// ============================================================================
// SECTION: Static Token
// ============================================================================

/// Provider returning a fixed bearer token.
#[derive(Clone)]
pub struct StaticTokenAuth {
    /// Control-plane base URL.
    base_url: String,
    /// Bearer token.
    token: String,
}

impl StaticTokenAuth {
    /// Creates a static token provider.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AuthProvider for StaticTokenAuth {
    fn request_context(&self) -> Result<RequestContext, AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::MissingCredential("bearer token is empty".to_string()));
        }
        Ok(RequestContext::new(self.base_url.clone(), self.token.clone()))
    }
}

// ============================================================================
// SECTION: Client Credentials
// ============================================================================

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    /// Issued access token.
    #[serde(default)]
    access_token: Option<String>,
}

/// Provider exchanging client credentials for a token on every call.
pub struct ClientCredentialsAuth {
    /// Control-plane base URL.
    base_url: String,
    /// Connected-app client id.
    client_id: String,
    /// Connected-app client secret.
    client_secret: String,
    /// HTTP client used for token requests.
    client: Client,
}

impl ClientCredentialsAuth {
    /// Creates a client-credentials provider.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        http: &HttpConfig,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client: build_client(http)?,
        })
    }

    /// Requests an access token.
    fn fetch_token(&self) -> Result<String, AuthError> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", CLIENT_CREDENTIALS_GRANT)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .finish();
        let mut response = self
            .client
            .post(format!("{}{TOKEN_PATH}", self.base_url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(form)
            .send()
            .map_err(|err| AuthError::TokenRequest(err.to_string()))?;
        let status = response.status().as_u16();
        let body = read_body_limited(&mut response, MAX_RESPONSE_BYTES)
            .map_err(AuthError::InvalidResponse)?;
        if status >= 400 {
            return Err(AuthError::TokenRequest(format!("HTTP {status}: {}", body.trim())));
        }
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
        parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("access_token missing".to_string()))
    }
}

impl fmt::Debug for ClientCredentialsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsAuth")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl AuthProvider for ClientCredentialsAuth {
    fn request_context(&self) -> Result<RequestContext, AuthError> {
        let token = self.fetch_token()?;
        Ok(RequestContext::new(self.base_url.clone(), token))
    }
}

// ============================================================================
// SECTION: Configured Provider
// ============================================================================

/// Provider selected by configuration.
#[derive(Debug)]
pub enum ConfiguredAuth {
    /// Pre-issued bearer token.
    Static(StaticTokenAuth),
    /// Client-credentials exchange.
    ClientCredentials(ClientCredentialsAuth),
}

impl ConfiguredAuth {
    /// Builds the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when credentials cannot be resolved or the HTTP
    /// client cannot be created.
    pub fn from_config(config: &ApimPolicyConfig) -> Result<Self, ClientError> {
        let base_url = config.control_plane.resolved_base_url();
        Ok(match config.auth.resolve()? {
            ResolvedAuth::BearerToken(token) => Self::Static(StaticTokenAuth::new(base_url, token)),
            ResolvedAuth::ClientCredentials {
                client_id,
                client_secret,
            } => Self::ClientCredentials(ClientCredentialsAuth::new(
                base_url,
                client_id,
                client_secret,
                &config.http,
            )?),
        })
    }
}

impl AuthProvider for ConfiguredAuth {
    fn request_context(&self) -> Result<RequestContext, AuthError> {
        match self {
            Self::Static(auth) => auth.request_context(),
            Self::ClientCredentials(auth) => auth.request_context(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
