// crates/apim-policy-core/src/lib.rs
// ============================================================================
// Module: APIM Policy Core Library
// Description: Policy configuration engine for API-gateway policy attachments.
// Purpose: Reconcile declared policy state with the API Manager control plane.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `apim-policy-core` manages policy attachments (rate limiting, client-id
//! enforcement, JWT validation, message logging, and custom policies) on a
//! gateway-managed API instance. It converts between three shapes:
//! - the typed [`PolicyDeclaration`],
//! - the nested remote [`RemotePolicyDocument`],
//! - the create/patch bodies submitted to the platform.
//!
//! Invariants:
//! - Validation runs before any create or update is submitted.
//! - Local state is only replaced after a successful remote read-back.
//! - Remote calls go through [`PolicyOperations`]; the core performs no I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attributes;
pub mod audit;
pub mod builders;
pub mod codec;
pub mod configuration;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod identifiers;
pub mod interfaces;
pub mod lifecycle;
pub mod model;
pub mod parsers;
pub mod pointcut;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attributes::AttributeBag;
pub use attributes::PolicyResource;
pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::PolicyAuditEvent;
pub use audit::PolicyAuditSink;
pub use audit::StderrAuditSink;
pub use audit::WriterAuditSink;
pub use configuration::ClientIdEnforcementConfig;
pub use configuration::CredentialsOrigin;
pub use configuration::CustomClaim;
pub use configuration::CustomPolicyConfig;
pub use configuration::JwtKeyOrigin;
pub use configuration::JwtOrigin;
pub use configuration::JwtValidationConfig;
pub use configuration::LogLevel;
pub use configuration::LoggingRule;
pub use configuration::MessageLoggingConfig;
pub use configuration::PolicyConfiguration;
pub use configuration::PolicyKind;
pub use configuration::RateLimitTier;
pub use configuration::RateLimitingConfig;
pub use configuration::SigningMethod;
pub use diagnostics::Diagnostic;
pub use diagnostics::Diagnostics;
pub use diagnostics::Severity;
pub use document::CreatePolicyBody;
pub use document::PatchPolicyBody;
pub use document::RemoteAudit;
pub use document::RemoteAuditStamp;
pub use document::RemotePointcut;
pub use document::RemotePolicyDocument;
pub use error::MappingError;
pub use error::Operation;
pub use error::PolicyError;
pub use identifiers::COMPOSITE_ID_SEPARATOR;
pub use identifiers::CompositeId;
pub use identifiers::IdentifierError;
pub use identifiers::PolicyId;
pub use interfaces::AuthError;
pub use interfaces::AuthProvider;
pub use interfaces::PolicyOperations;
pub use interfaces::RemoteError;
pub use interfaces::RequestContext;
pub use lifecycle::PolicyLifecycle;
pub use model::AssetCoordinates;
pub use model::PolicyAudit;
pub use model::PolicyDeclaration;
pub use model::PolicyScope;
pub use model::RemoteAttributes;
pub use pointcut::PointcutCondition;
pub use validation::FieldError;
pub use validation::ValidationErrors;
