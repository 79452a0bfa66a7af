// crates/apim-policy-core/src/configuration/rate_limiting.rs
// ============================================================================
// Module: Rate Limiting Configuration
// Description: Declared configuration for the rate limiting template.
// Purpose: Model request quotas per time window.
// Dependencies: serde
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Single quota tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitTier {
    /// Requests allowed per window.
    pub maximum_requests: u64,
    /// Window length in milliseconds.
    pub time_period_in_milliseconds: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Quota tiers.
    pub rate_limits: Vec<RateLimitTier>,
    /// Expression selecting the quota key.
    pub key_selector: Option<String>,
    /// Expose `X-RateLimit-*` headers.
    pub expose_headers: bool,
    /// Share quota state across a cluster.
    pub clusterizable: bool,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            rate_limits: Vec::new(),
            key_selector: None,
            expose_headers: false,
            clusterizable: true,
        }
    }
}
