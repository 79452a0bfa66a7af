// crates/apim-policy-config/src/config.rs
// ============================================================================
// Module: APIM Policy Configuration
// Description: Configuration loading and validation for the policy tooling.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path resolves from an explicit argument, then [`CONFIG_ENV_VAR`], then
//! [`DEFAULT_CONFIG_NAME`] in the working directory.
//!
//! Secrets may be given inline or by naming an environment variable; they are
//! resolved on demand through [`AuthConfig::resolve`] and never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "apim-policy.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "APIM_POLICY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum HTTP timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum HTTP timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Default HTTP timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum user agent length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;
/// Maximum length of an inline credential value.
pub(crate) const MAX_CREDENTIAL_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Policy tooling configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApimPolicyConfig {
    /// Control-plane selection.
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,
    /// Credential configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// HTTP transport limits.
    #[serde(default)]
    pub http: HttpConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ApimPolicyConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.control_plane.validate()?;
        self.auth.validate()?;
        self.http.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Control Plane
// ============================================================================

/// Hosted control-plane regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// United States control plane.
    #[default]
    Us,
    /// European Union control plane.
    Eu,
    /// Government cloud control plane.
    Gov,
}

impl Region {
    /// Returns the region's base URL.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://anypoint.mulesoft.com",
            Self::Eu => "https://eu1.anypoint.mulesoft.com",
            Self::Gov => "https://gov.anypoint.mulesoft.com",
        }
    }
}

/// Control-plane selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlPlaneConfig {
    /// Hosted region.
    #[serde(default)]
    pub region: Region,
    /// Explicit base URL overriding the region.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Allow non-TLS base URLs (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl ControlPlaneConfig {
    /// Returns the effective base URL without a trailing slash.
    #[must_use]
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.region.base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Validates control-plane configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(base_url) = &self.base_url else {
            return Ok(());
        };
        let parsed = Url::parse(base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("control_plane.base_url is not a valid url: {err}"))
        })?;
        match parsed.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(
                    "control_plane.base_url uses http:// without allow_http".to_string(),
                ));
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "control_plane.base_url has unsupported scheme: {other}"
                )));
            }
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("control_plane.base_url must include a host".to_string()));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(ConfigError::Invalid(
                "control_plane.base_url must not embed credentials".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Auth
// ============================================================================

/// Credential acquisition modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// OAuth2 client-credentials grant against the control plane.
    #[default]
    ClientCredentials,
    /// Pre-issued bearer token.
    BearerToken,
}

/// Credential configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Acquisition mode.
    #[serde(default)]
    pub mode: AuthMode,
    /// Connected-app client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Connected-app client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Environment variable holding the client secret.
    #[serde(default)]
    pub client_secret_env: Option<String>,
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("client_secret_env", &self.client_secret_env)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

impl AuthConfig {
    /// Validates credential configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            AuthMode::ClientCredentials => {
                require_value("auth.client_id", self.client_id.as_deref())?;
                exactly_one(
                    "auth.client_secret",
                    self.client_secret.as_deref(),
                    self.client_secret_env.as_deref(),
                )?;
                reject_present("auth.token", self.token.is_some())?;
                reject_present("auth.token_env", self.token_env.is_some())?;
            }
            AuthMode::BearerToken => {
                exactly_one("auth.token", self.token.as_deref(), self.token_env.as_deref())?;
                reject_present("auth.client_secret", self.client_secret.is_some())?;
                reject_present("auth.client_secret_env", self.client_secret_env.is_some())?;
            }
        }
        Ok(())
    }

    /// Resolves credentials, reading named environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a referenced variable is unset or empty.
    pub fn resolve(&self) -> Result<ResolvedAuth, ConfigError> {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolves credentials using `lookup` for environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a referenced variable is unset or empty.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedAuth, ConfigError> {
        match self.mode {
            AuthMode::ClientCredentials => Ok(ResolvedAuth::ClientCredentials {
                client_id: require_value("auth.client_id", self.client_id.as_deref())?
                    .to_string(),
                client_secret: secret_value(
                    "auth.client_secret",
                    self.client_secret.as_deref(),
                    self.client_secret_env.as_deref(),
                    &lookup,
                )?,
            }),
            AuthMode::BearerToken => Ok(ResolvedAuth::BearerToken(secret_value(
                "auth.token",
                self.token.as_deref(),
                self.token_env.as_deref(),
                &lookup,
            )?)),
        }
    }
}

/// Credentials with every secret resolved.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedAuth {
    /// OAuth2 client-credentials pair.
    ClientCredentials {
        /// Connected-app client id.
        client_id: String,
        /// Connected-app client secret.
        client_secret: String,
    },
    /// Pre-issued bearer token.
    BearerToken(String),
}

impl fmt::Debug for ResolvedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials {
                client_id, ..
            } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&"<redacted>").finish(),
        }
    }
}

// ============================================================================
// SECTION: HTTP
// ============================================================================

/// HTTP transport limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates HTTP limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must be non-empty".to_string()));
        }
        if agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid("http.user_agent exceeds max length".to_string()));
        }
        Ok(())
    }
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default user agent.
fn default_user_agent() -> String {
    format!("apim-policy/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON lines file.
    File,
    /// Discard events.
    None,
}

/// Audit sink selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (required for the file sink).
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Requires a non-blank, bounded value.
fn require_value<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    let value = value.map(str::trim).filter(|value| !value.is_empty());
    let Some(value) = value else {
        return Err(ConfigError::Invalid(format!("{field} must be set")));
    };
    if value.len() > MAX_CREDENTIAL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(value)
}

/// Requires exactly one of an inline value and its `_env` variant.
fn exactly_one(
    field: &str,
    inline: Option<&str>,
    env_name: Option<&str>,
) -> Result<(), ConfigError> {
    match (inline, env_name) {
        (Some(value), None) => require_value(field, Some(value)).map(|_| ()),
        (None, Some(name)) => require_value(&format!("{field}_env"), Some(name)).map(|_| ()),
        (Some(_), Some(_)) => {
            Err(ConfigError::Invalid(format!("{field} and {field}_env are mutually exclusive")))
        }
        (None, None) => Err(ConfigError::Invalid(format!("{field} or {field}_env must be set"))),
    }
}

/// Rejects a value that does not apply to the selected mode.
fn reject_present(field: &str, present: bool) -> Result<(), ConfigError> {
    if present {
        return Err(ConfigError::Invalid(format!("{field} is not valid for this auth.mode")));
    }
    Ok(())
}

/// Resolves a secret from its inline value or named variable.
fn secret_value(
    field: &str,
    inline: Option<&str>,
    env_name: Option<&str>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if let Some(value) = inline {
        return require_value(field, Some(value)).map(str::to_string);
    }
    let name = require_value(&format!("{field}_env"), env_name)?;
    let value = lookup(name).ok_or_else(|| {
        ConfigError::Invalid(format!("{field}_env names unset variable {name}"))
    })?;
    require_value(name, Some(value.as_str())).map(str::to_string)
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

    const MINIMAL: &str = r#"
        [auth]
        client_id = "app"
        client_secret_env = "APIM_CLIENT_SECRET"
    "#;

    #[test]
    fn defaults_apply_to_minimal_config() {
        let config = ApimPolicyConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.control_plane.region, Region::Us);
        assert_eq!(config.control_plane.resolved_base_url(), "https://anypoint.mulesoft.com");
        assert_eq!(config.http.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.http.user_agent.starts_with("apim-policy/"));
        assert_eq!(config.audit.sink, AuditSinkKind::Stderr);
    }

    #[test]
    fn base_url_overrides_region_and_drops_trailing_slash() {
        let config = ControlPlaneConfig {
            region: Region::Eu,
            base_url: Some("https://gateway.internal.test/".to_string()),
            allow_http: false,
        };
        assert_eq!(config.resolved_base_url(), "https://gateway.internal.test");
        let regional = ControlPlaneConfig {
            region: Region::Gov,
            ..ControlPlaneConfig::default()
        };
        assert_eq!(regional.resolved_base_url(), "https://gov.anypoint.mulesoft.com");
    }

    #[test]
    fn http_base_url_requires_opt_in() {
        let mut config = ControlPlaneConfig {
            base_url: Some("http://127.0.0.1:8080".to_string()),
            ..ControlPlaneConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allow_http"));
        config.allow_http = true;
        config.validate().unwrap();
    }

    #[test]
    fn client_credentials_require_one_secret_source() {
        let both = AuthConfig {
            client_id: Some("app".to_string()),
            client_secret: Some("s".to_string()),
            client_secret_env: Some("S".to_string()),
            ..AuthConfig::default()
        };
        assert!(both.validate().unwrap_err().to_string().contains("mutually exclusive"));
        let neither = AuthConfig {
            client_id: Some("app".to_string()),
            ..AuthConfig::default()
        };
        assert!(neither.validate().unwrap_err().to_string().contains("auth.client_secret"));
    }

    #[test]
    fn bearer_mode_rejects_client_secret() {
        let config = AuthConfig {
            mode: AuthMode::BearerToken,
            token: Some("t".to_string()),
            client_secret: Some("s".to_string()),
            ..AuthConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("auth.client_secret"));
    }

    #[test]
    fn resolve_reads_named_variables() {
        let config = AuthConfig {
            client_id: Some("app".to_string()),
            client_secret_env: Some("APIM_CLIENT_SECRET".to_string()),
            ..AuthConfig::default()
        };
        let resolved = config
            .resolve_with(|name| (name == "APIM_CLIENT_SECRET").then(|| "hunter2".to_string()))
            .unwrap();
        assert_eq!(
            resolved,
            ResolvedAuth::ClientCredentials {
                client_id: "app".to_string(),
                client_secret: "hunter2".to_string(),
            }
        );
        assert!(!format!("{resolved:?}").contains("hunter2"));
        let err = config.resolve_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("unset variable APIM_CLIENT_SECRET"));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let config = HttpConfig {
            timeout_ms: 50,
            ..HttpConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("http.timeout_ms"));
    }

    #[test]
    fn file_sink_requires_path() {
        let config = AuditConfig {
            sink: AuditSinkKind::File,
            path: None,
        };
        assert!(config.validate().is_err());
        let stray = AuditConfig {
            sink: AuditSinkKind::None,
            path: Some("audit.log".to_string()),
        };
        assert!(stray.validate().is_err());
    }

    #[test]
    fn debug_redacts_inline_secrets() {
        let config = AuthConfig {
            client_id: Some("app".to_string()),
            client_secret: Some("hunter2".to_string()),
            ..AuthConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
