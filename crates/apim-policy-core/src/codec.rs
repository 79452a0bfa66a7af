// crates/apim-policy-core/src/codec.rs
// ============================================================================
// Module: Attribute Codec
// Description: Key-case conversion between local and remote policy documents.
// Purpose: Map snake_case declared keys onto lowerCamelCase wire keys and back.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The codec converts attribute keys between the declared naming convention
//! (`jwt_key_origin`) and the remote convention (`jwtKeyOrigin`). Conversion is
//! pure and lossless for snake_case identifiers made of lowercase ASCII
//! letters, digits, and single underscores that precede a letter.
//! Characters outside that alphabet pass through unchanged.
//!
//! Object helpers convert a single object level only. Nested objects and arrays
//! must be converted per element by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Key Conversion
// ============================================================================

/// Converts a declared snake_case key into its remote lowerCamelCase form.
///
/// An underscore followed by a lowercase ASCII letter is dropped and the letter
/// is upper-cased; every other character is copied verbatim.
#[must_use]
pub fn to_remote_key(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_'
            && let Some(next) = chars.peek().copied()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

/// Converts a remote lowerCamelCase key into its declared snake_case form.
///
/// Each uppercase ASCII letter becomes an underscore followed by its lowercase
/// form; every other character is copied verbatim.
#[must_use]
pub fn to_local_key(remote: &str) -> String {
    let mut out = String::with_capacity(remote.len() + 4);
    for ch in remote.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ============================================================================
// SECTION: Object Conversion
// ============================================================================

/// Converts the top-level keys of a declared object into remote keys.
#[must_use]
pub fn to_remote_object(local: &Map<String, Value>) -> Map<String, Value> {
    local.iter().map(|(key, value)| (to_remote_key(key), value.clone())).collect()
}

/// Converts the top-level keys of a remote object into declared keys.
#[must_use]
pub fn to_local_object(remote: &Map<String, Value>) -> Map<String, Value> {
    remote.iter().map(|(key, value)| (to_local_key(key), value.clone())).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
