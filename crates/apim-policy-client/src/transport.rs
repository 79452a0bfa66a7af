// crates/apim-policy-client/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Shared blocking client construction and bounded body reads.
// Purpose: Apply configured timeouts and response limits to every request.
// Dependencies: apim-policy-config, reqwest
// ============================================================================

//! ## Overview
//! Shared blocking client construction and bounded body reads that apply
//! configured timeouts and response limits to every request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use apim_policy_config::HttpConfig;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;

use crate::error::ClientError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum response body size accepted from the control plane.
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Builds a blocking client with the configured timeout and user agent.
///
/// Redirects are not followed.
///
/// # Errors
///
/// Returns [`ClientError::Build`] when the client cannot be created.
pub fn build_client(config: &HttpConfig) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|err| ClientError::Build(err.to_string()))
}

/// Reads a response body as UTF-8 text, failing past `max_bytes`.
pub(crate) fn read_body_limited(response: &mut Response, max_bytes: usize) -> Result<String, String> {
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err("http response exceeds size limit".to_string());
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| format!("failed to read response: {err}"))?;
    if buf.len() > max_bytes {
        return Err("http response exceeds size limit".to_string());
    }
    String::from_utf8(buf).map_err(|_| "http response is not utf-8".to_string())
}
