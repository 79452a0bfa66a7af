// crates/apim-policy-client/src/lib.rs
// ============================================================================
// Module: APIM Policy Client Library
// Description: HTTP transport and credential providers for the policy engine.
// Purpose: Bind the core lifecycle to the API Manager REST surface.
// Dependencies: apim-policy-config, apim-policy-core, reqwest
// ============================================================================

//! ## Overview
//! `apim-policy-client` implements the core collaborator traits over blocking
//! HTTP:
//! - [`HttpPolicyOperations`] for the policy REST endpoints,
//! - [`StaticTokenAuth`] and [`ClientCredentialsAuth`] for request contexts,
//! - [`connect`] to assemble a lifecycle from loaded configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod connect;
pub mod error;
pub mod http;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::ClientCredentialsAuth;
pub use auth::ConfiguredAuth;
pub use auth::StaticTokenAuth;
pub use auth::TOKEN_PATH;
pub use connect::HttpPolicyLifecycle;
pub use connect::audit_sink;
pub use connect::connect;
pub use error::ClientError;
pub use http::HttpPolicyOperations;
