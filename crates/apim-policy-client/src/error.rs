// crates/apim-policy-client/src/error.rs
// ============================================================================
// Module: Client Errors
// Description: Failures raised while assembling the HTTP policy client.
// Purpose: Keep construction failures distinct from per-call remote errors.
// Dependencies: apim-policy-config, thiserror
// ============================================================================

//! ## Overview
//! Failures raised while assembling the HTTP policy client, kept distinct
//! from per-call remote errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use apim_policy_config::ConfigError;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be applied.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
    /// Audit sink could not be opened.
    #[error("audit sink unavailable: {0}")]
    Audit(String),
}
