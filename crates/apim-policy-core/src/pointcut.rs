// crates/apim-policy-core/src/pointcut.rs
// ============================================================================
// Module: Pointcut Conditions
// Description: HTTP method / URI conditions restricting where a policy applies.
// Purpose: Encode method sets into the remote regex form and back.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A pointcut condition pairs a set of HTTP methods with a URI template regex.
//! The remote platform stores the method set as a single `|`-joined string
//! (`GET|POST`), which it evaluates as an alternation. Methods are joined in
//! sorted order so repeated builds produce identical documents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::document::RemotePointcut;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delimiter used to join HTTP methods into the remote method regex.
pub const METHOD_SEPARATOR: char = '|';

/// HTTP methods accepted in pointcut conditions.
pub const SUPPORTED_HTTP_METHODS: &[&str] =
    &["CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Declared pointcut condition.
///
/// # Invariants
/// - Valid conditions carry at least one method and a non-empty URI regex
///   (enforced by [`crate::validation`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointcutCondition {
    /// HTTP methods the policy applies to.
    #[serde(default)]
    pub http_methods: BTreeSet<String>,
    /// URI template regex the policy applies to.
    #[serde(default)]
    pub uri_template_regex: String,
}

impl PointcutCondition {
    /// Creates a condition from methods and a URI regex.
    #[must_use]
    pub fn new<I, S>(methods: I, uri_template_regex: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            http_methods: methods.into_iter().map(Into::into).collect(),
            uri_template_regex: uri_template_regex.into(),
        }
    }

    /// Converts the condition into its remote form.
    #[must_use]
    pub fn to_remote(&self) -> RemotePointcut {
        RemotePointcut {
            method_regex: join_methods(&self.http_methods),
            uri_template_regex: self.uri_template_regex.clone(),
        }
    }

    /// Reconstructs a condition from its remote form.
    #[must_use]
    pub fn from_remote(remote: &RemotePointcut) -> Self {
        Self {
            http_methods: split_methods(&remote.method_regex),
            uri_template_regex: remote.uri_template_regex.clone(),
        }
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Joins a method set into the remote `|`-delimited form.
#[must_use]
pub fn join_methods(methods: &BTreeSet<String>) -> String {
    let mut joined = String::new();
    for method in methods {
        if !joined.is_empty() {
            joined.push(METHOD_SEPARATOR);
        }
        joined.push_str(method);
    }
    joined
}

/// Splits a remote method regex back into a method set.
#[must_use]
pub fn split_methods(joined: &str) -> BTreeSet<String> {
    joined
        .split(METHOD_SEPARATOR)
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encodes declared conditions; `None` when there are none.
#[must_use]
pub fn encode_pointcuts(conditions: &[PointcutCondition]) -> Option<Vec<RemotePointcut>> {
    if conditions.is_empty() {
        return None;
    }
    Some(conditions.iter().map(PointcutCondition::to_remote).collect())
}

/// Decodes remote pointcut data; absent data means "apply everywhere".
#[must_use]
pub fn decode_pointcuts(remote: Option<&[RemotePointcut]>) -> Vec<PointcutCondition> {
    remote.map(|items| items.iter().map(PointcutCondition::from_remote).collect()).unwrap_or_default()
}

/// Returns true when the method is one of [`SUPPORTED_HTTP_METHODS`].
#[must_use]
pub fn is_supported_method(method: &str) -> bool {
    SUPPORTED_HTTP_METHODS.contains(&method)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
