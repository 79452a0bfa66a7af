// crates/apim-policy-client/src/http.rs
// ============================================================================
// Module: HTTP Policy Operations
// Description: REST mapping of the remote policy operations.
// Purpose: Perform one bounded, authenticated round trip per operation.
// Dependencies: apim-policy-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpPolicyOperations`] maps each [`PolicyOperations`] call to the API
//! Manager policy collection of an API instance:
//!
//! | Operation | Request                     |
//! |-----------|-----------------------------|
//! | create    | `POST   .../policies`       |
//! | get       | `GET    .../policies/{id}`  |
//! | patch     | `PATCH  .../policies/{id}`  |
//! | delete    | `DELETE .../policies/{id}`  |
//! | enable    | `POST   .../{id}/enable`    |
//! | disable   | `POST   .../{id}/disable`   |
//!
//! Any status of 400 or above becomes a [`RemoteError`] carrying the body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use apim_policy_config::HttpConfig;
use apim_policy_core::CreatePolicyBody;
use apim_policy_core::PatchPolicyBody;
use apim_policy_core::PolicyId;
use apim_policy_core::PolicyOperations;
use apim_policy_core::PolicyScope;
use apim_policy_core::RemoteError;
use apim_policy_core::RemotePolicyDocument;
use apim_policy_core::RequestContext;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::error::ClientError;
use crate::transport::MAX_RESPONSE_BYTES;
use crate::transport::build_client;
use crate::transport::read_body_limited;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON media type.
const APPLICATION_JSON: &str = "application/json";

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Remote policy operations over blocking HTTP.
pub struct HttpPolicyOperations {
    /// HTTP client used for outbound requests.
    client: Client,
    /// Maximum accepted response size.
    max_response_bytes: usize,
}

impl HttpPolicyOperations {
    /// Creates operations with the configured transport limits.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the HTTP client cannot be created.
    pub fn new(config: &HttpConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(config)?,
            max_response_bytes: MAX_RESPONSE_BYTES,
        })
    }

    /// Sends an authenticated request and returns the response text.
    fn send(&self, ctx: &RequestContext, request: RequestBuilder) -> Result<String, RemoteError> {
        let mut response = request
            .bearer_auth(&ctx.bearer_token)
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .map_err(|err| RemoteError::transport(format!("request failed: {err}")))?;
        let status = response.status().as_u16();
        let body = read_body_limited(&mut response, self.max_response_bytes)
            .map_err(|message| RemoteError::http(status, None, message))?;
        if status >= 400 {
            return Err(RemoteError::http(status, Some(body), format!("HTTP {status}")));
        }
        Ok(body)
    }

    /// Sends a request carrying a JSON body.
    fn send_json<T: Serialize>(
        &self,
        ctx: &RequestContext,
        request: RequestBuilder,
        body: &T,
    ) -> Result<String, RemoteError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| RemoteError::transport(format!("request body encoding failed: {err}")))?;
        self.send(ctx, request.header(CONTENT_TYPE, APPLICATION_JSON).body(payload))
    }
}

impl PolicyOperations for HttpPolicyOperations {
    fn create_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        body: &CreatePolicyBody,
    ) -> Result<PolicyId, RemoteError> {
        let url = policies_url(ctx, scope, &[])?;
        let text = self.send_json(ctx, self.client.post(url), body)?;
        parse_document(&text)?
            .id
            .ok_or_else(|| RemoteError::transport("create response has no policy id"))
    }

    fn get_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<RemotePolicyDocument, RemoteError> {
        let url = policies_url(ctx, scope, &[id.as_str()])?;
        let text = self.send(ctx, self.client.get(url))?;
        parse_document(&text)
    }

    fn patch_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
        body: &PatchPolicyBody,
    ) -> Result<(), RemoteError> {
        let url = policies_url(ctx, scope, &[id.as_str()])?;
        self.send_json(ctx, self.client.patch(url), body).map(|_| ())
    }

    fn delete_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let url = policies_url(ctx, scope, &[id.as_str()])?;
        self.send(ctx, self.client.delete(url)).map(|_| ())
    }

    fn enable_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let url = policies_url(ctx, scope, &[id.as_str(), "enable"])?;
        self.send(ctx, self.client.post(url)).map(|_| ())
    }

    fn disable_policy(
        &self,
        ctx: &RequestContext,
        scope: &PolicyScope,
        id: &PolicyId,
    ) -> Result<(), RemoteError> {
        let url = policies_url(ctx, scope, &[id.as_str(), "disable"])?;
        self.send(ctx, self.client.post(url)).map(|_| ())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a URL under the API instance's policy collection.
///
/// Scope values are percent-encoded as individual path segments.
pub(crate) fn policies_url(
    ctx: &RequestContext,
    scope: &PolicyScope,
    tail: &[&str],
) -> Result<Url, RemoteError> {
    let mut url = Url::parse(&ctx.base_url)
        .map_err(|err| RemoteError::transport(format!("invalid base url: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| RemoteError::transport("base url cannot carry a path"))?
        .pop_if_empty()
        .extend([
            "apimanager",
            "api",
            "v1",
            "organizations",
            scope.org_id.as_str(),
            "environments",
            scope.env_id.as_str(),
            "apis",
            scope.api_instance_id.as_str(),
            "policies",
        ])
        .extend(tail);
    Ok(url)
}

/// Parses a policy document from response text.
fn parse_document(text: &str) -> Result<RemotePolicyDocument, RemoteError> {
    serde_json::from_str(text)
        .map_err(|err| RemoteError::transport(format!("invalid policy document: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
