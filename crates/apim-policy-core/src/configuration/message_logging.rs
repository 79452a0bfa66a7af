// crates/apim-policy-core/src/configuration/message_logging.rs
// ============================================================================
// Module: Message Logging Configuration
// Description: Declared configuration for the message logging template.
// Purpose: Model named logging rules.
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

/// Gateway log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational.
    #[default]
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
    /// Debug.
    Debug,
    /// Trace.
    Trace,
}

impl LogLevel {
    /// Returns the wire label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

/// Single logging rule.
///
/// # Invariants
/// - `name` is unique within a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingRule {
    /// Rule name.
    pub name: String,
    /// Message expression.
    pub message: String,
    /// Optional condition expression.
    pub conditional: Option<String>,
    /// Optional log category.
    pub category: Option<String>,
    /// Log level.
    pub level: LogLevel,
    /// Log before calling the API.
    pub first_section: bool,
    /// Log after calling the API.
    pub second_section: bool,
}

impl Default for LoggingRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            message: String::new(),
            conditional: None,
            category: None,
            level: LogLevel::default(),
            first_section: true,
            second_section: false,
        }
    }
}

/// Message logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLoggingConfig {
    /// Logging rules.
    pub logging_configuration: Vec<LoggingRule>,
}
