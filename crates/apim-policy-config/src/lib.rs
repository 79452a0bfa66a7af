// crates/apim-policy-config/src/lib.rs
// ============================================================================
// Module: APIM Policy Config Library
// Description: Configuration model and validation for the policy tooling.
// Purpose: Single source of truth for apim-policy.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `apim-policy-config` defines the configuration consumed by the policy
//! client and CLI: control-plane selection, credentials, HTTP limits, and the
//! audit sink. Loading is strict and fails closed.
//!
//! Security posture: config inputs are untrusted and secrets are never
//! rendered by `Debug`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
