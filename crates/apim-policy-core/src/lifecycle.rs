// crates/apim-policy-core/src/lifecycle.rs
// ============================================================================
// Module: Policy Lifecycle
// Description: Create, read, update, delete, and import orchestration.
// Purpose: Sequence remote calls and read-backs around validation and mapping.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`PolicyLifecycle`] drives each transition as a strict sequence of single
//! remote round trips. Every entry point acquires a fresh
//! [`RequestContext`] and threads it through all of its calls. Nothing is
//! retried.
//!
//! Invariants:
//! - Validation happens before any create or update call.
//! - Returned state always reflects a successful remote read-back.
//! - Content updates and enable/disable toggles are independent triggers.
//! - Every remote call records one audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::audit::NoopAuditSink;
use crate::audit::PolicyAuditEvent;
use crate::audit::PolicyAuditSink;
use crate::builders::build_create_body;
use crate::builders::build_patch_body;
use crate::document::PatchPolicyBody;
use crate::error::MappingError;
use crate::error::Operation;
use crate::error::PolicyError;
use crate::identifiers::CompositeId;
use crate::identifiers::PolicyId;
use crate::interfaces::AuthProvider;
use crate::interfaces::PolicyOperations;
use crate::interfaces::RemoteError;
use crate::interfaces::RequestContext;
use crate::model::PolicyDeclaration;
use crate::model::PolicyScope;
use crate::parsers::declaration_from_remote;
use crate::parsers::parse_configuration;
use crate::pointcut::decode_pointcuts;
use crate::validation::FieldError;
use crate::validation::ValidationErrors;
use crate::validation::validate_declaration;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Scope and id addressing one remote policy.
#[derive(Debug, Clone)]
struct PolicyAddress {
    /// Addressing scope.
    scope: PolicyScope,
    /// Remote policy id.
    id: PolicyId,
}

/// Lifecycle orchestrator over remote operations and an auth provider.
pub struct PolicyLifecycle<O, A> {
    /// Remote operations collaborator.
    operations: O,
    /// Request context factory.
    auth: A,
    /// Audit sink for remote calls and rejected validations.
    audit: Arc<dyn PolicyAuditSink>,
}

impl<O, A> PolicyLifecycle<O, A>
where
    O: PolicyOperations,
    A: AuthProvider,
{
    /// Creates a lifecycle with a no-op audit sink.
    #[must_use]
    pub fn new(operations: O, auth: A) -> Self {
        Self {
            operations,
            auth,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn PolicyAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the remote operations collaborator.
    pub const fn operations(&self) -> &O {
        &self.operations
    }

    // ========================================================================
    // SECTION: Entry Points
    // ========================================================================

    /// Creates the declared policy and returns the read-back state.
    ///
    /// A declaration with `disabled = true` is created, read back, disabled,
    /// and read back again.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] on validation, auth, remote, or mapping failure.
    pub fn create(&self, declaration: &PolicyDeclaration) -> Result<PolicyDeclaration, PolicyError> {
        self.validate(Operation::Create, declaration)?;
        let ctx = self.auth.request_context()?;
        let scope = &declaration.scope;
        let asset_id = declaration.asset.asset_id.as_str();
        let body = build_create_body(declaration)?;
        let id = self
            .audited(Operation::Create, scope, None, asset_id, |ops| {
                ops.create_policy(&ctx, scope, &body)
            })
            .map_err(|err| remote_failure(Operation::Create, asset_id, &err))?;

        let mut previous = declaration.clone();
        previous.id = Some(id.clone());
        let address = PolicyAddress {
            scope: scope.clone(),
            id,
        };
        let mut state = self.read_back(&ctx, &address, &previous)?;
        if declaration.disabled {
            self.toggle(&ctx, &address, asset_id, true)?;
            state = self.read_back(&ctx, &address, &previous)?;
        }
        Ok(state)
    }

    /// Refreshes state from the remote platform.
    ///
    /// Composite stored ids are decomposed first. Returns `Ok(None)` when the
    /// declaration has no id or the remote reports the policy as gone.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] on identifier, auth, remote, or mapping failure.
    pub fn read(&self, declaration: &PolicyDeclaration) -> Result<Option<PolicyDeclaration>, PolicyError> {
        let Some(address) = resolve_address(declaration)? else {
            return Ok(None);
        };
        let ctx = self.auth.request_context()?;
        self.fetch(&ctx, Operation::Read, &address, Some(declaration))
    }

    /// Applies the planned declaration over the prior state.
    ///
    /// Content changes issue a patch; a changed `disabled` flag issues an
    /// enable or disable. Each trigger is followed by a read-back. When
    /// neither fires a single refresh read is performed.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when identity or asset coordinates change, or
    /// on validation, auth, remote, or mapping failure.
    pub fn update(
        &self,
        prior: &PolicyDeclaration,
        planned: &PolicyDeclaration,
    ) -> Result<PolicyDeclaration, PolicyError> {
        let replaced = planned.replacement_fields(prior);
        if !replaced.is_empty() {
            let mut errors = ValidationErrors::new();
            for field in replaced {
                errors.push(FieldError::new(field, "changing this attribute requires replacement"));
            }
            return Err(self.reject(Operation::Update, planned, errors));
        }
        self.validate(Operation::Update, planned)?;
        let address = resolve_address(prior)?
            .ok_or_else(|| MappingError::new("id", "policy has no remote id"))?;
        let ctx = self.auth.request_context()?;
        let asset_id = planned.asset.asset_id.as_str();

        let mut previous = planned.clone();
        previous.id = Some(address.id.clone());
        let mut state = None;
        let body = build_patch_body(planned)?;
        if content_changed(prior, planned, &body)? {
            self.audited(Operation::Update, &address.scope, Some(&address.id), asset_id, |ops| {
                ops.patch_policy(&ctx, &address.scope, &address.id, &body)
            })
            .map_err(|err| remote_failure(Operation::Update, asset_id, &err))?;
            state = Some(self.read_back(&ctx, &address, &previous)?);
        }
        if planned.disabled != prior.disabled {
            self.toggle(&ctx, &address, asset_id, planned.disabled)?;
            state = Some(self.read_back(&ctx, &address, &previous)?);
        }
        match state {
            Some(state) => Ok(state),
            None => self.read_back(&ctx, &address, &previous),
        }
    }

    /// Detaches the policy and clears the local id.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] on identifier, auth, or remote failure.
    pub fn delete(&self, declaration: &mut PolicyDeclaration) -> Result<(), PolicyError> {
        let Some(address) = resolve_address(declaration)? else {
            return Ok(());
        };
        let ctx = self.auth.request_context()?;
        let asset_id = declaration.asset.asset_id.as_str();
        self.audited(Operation::Delete, &address.scope, Some(&address.id), asset_id, |ops| {
            ops.delete_policy(&ctx, &address.scope, &address.id)
        })
        .map_err(|err| remote_failure(Operation::Delete, asset_id, &err))?;
        declaration.id = None;
        Ok(())
    }

    /// Adopts an existing remote policy from an `org/env/api/policy` id.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the id is malformed, the policy does not
    /// exist, or the remote document cannot be mapped.
    pub fn import(&self, composite: &str) -> Result<PolicyDeclaration, PolicyError> {
        let composite = CompositeId::parse(composite)?;
        let address = PolicyAddress {
            scope: composite.scope(),
            id: composite.policy_id,
        };
        let ctx = self.auth.request_context()?;
        self.fetch(&ctx, Operation::Import, &address, None)?.ok_or_else(|| PolicyError::Remote {
            operation: Operation::Import,
            asset_id: address.id.to_string(),
            status: Some(404),
            detail: format!("policy {} not found", address.id),
        })
    }

    // ========================================================================
    // SECTION: Steps
    // ========================================================================

    /// Validates a declaration, auditing rejections.
    fn validate(&self, operation: Operation, declaration: &PolicyDeclaration) -> Result<(), PolicyError> {
        validate_declaration(declaration).map_err(|errors| self.reject(operation, declaration, errors))
    }

    /// Records a validation rejection and converts it to an error.
    fn reject(
        &self,
        operation: Operation,
        declaration: &PolicyDeclaration,
        errors: ValidationErrors,
    ) -> PolicyError {
        self.audit.record(&PolicyAuditEvent::validation(
            operation,
            &declaration.scope,
            &declaration.asset.asset_id,
            errors.to_string(),
        ));
        PolicyError::Validation(errors)
    }

    /// Reads the policy after a write; a missing policy is an error here.
    fn read_back(
        &self,
        ctx: &RequestContext,
        address: &PolicyAddress,
        previous: &PolicyDeclaration,
    ) -> Result<PolicyDeclaration, PolicyError> {
        self.fetch(ctx, Operation::Read, address, Some(previous))?.ok_or_else(|| PolicyError::Remote {
            operation: Operation::Read,
            asset_id: previous.asset.asset_id.clone(),
            status: Some(404),
            detail: format!("policy {} not found after write", address.id),
        })
    }

    /// Reads and maps the policy; 404 yields `None`.
    fn fetch(
        &self,
        ctx: &RequestContext,
        operation: Operation,
        address: &PolicyAddress,
        previous: Option<&PolicyDeclaration>,
    ) -> Result<Option<PolicyDeclaration>, PolicyError> {
        let asset_id = previous.map_or_else(|| address.id.to_string(), |p| p.asset.asset_id.clone());
        let document = match self.audited(operation, &address.scope, Some(&address.id), &asset_id, |ops| {
            ops.get_policy(ctx, &address.scope, &address.id)
        }) {
            Ok(document) => document,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(remote_failure(operation, &asset_id, &err)),
        };
        let mut state = declaration_from_remote(&document, address.scope.clone(), previous)?;
        if state.id.is_none() {
            state.id = Some(address.id.clone());
        }
        Ok(Some(state))
    }

    /// Issues an enable or disable call.
    fn toggle(
        &self,
        ctx: &RequestContext,
        address: &PolicyAddress,
        asset_id: &str,
        disable: bool,
    ) -> Result<(), PolicyError> {
        let operation = if disable { Operation::Disable } else { Operation::Enable };
        self.audited(operation, &address.scope, Some(&address.id), asset_id, |ops| {
            if disable {
                ops.disable_policy(ctx, &address.scope, &address.id)
            } else {
                ops.enable_policy(ctx, &address.scope, &address.id)
            }
        })
        .map_err(|err| remote_failure(operation, asset_id, &err))
    }

    /// Runs one remote call and records its audit event.
    fn audited<T>(
        &self,
        operation: Operation,
        scope: &PolicyScope,
        id: Option<&PolicyId>,
        asset_id: &str,
        call: impl FnOnce(&O) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let event =
            PolicyAuditEvent::remote_call(operation, scope, id.map(ToString::to_string), asset_id);
        let result = call(&self.operations);
        match &result {
            Ok(_) => self.audit.record(&event),
            Err(err) => self.audit.record(&event.failed(err.status, err.message.clone())),
        }
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the remote address of a declaration, decomposing composite ids.
fn resolve_address(declaration: &PolicyDeclaration) -> Result<Option<PolicyAddress>, PolicyError> {
    let Some(id) = &declaration.id else {
        return Ok(None);
    };
    if id.is_composite() {
        let composite = CompositeId::parse(id.as_str())?;
        return Ok(Some(PolicyAddress {
            scope: composite.scope(),
            id: composite.policy_id,
        }));
    }
    Ok(Some(PolicyAddress {
        scope: declaration.scope.clone(),
        id: id.clone(),
    }))
}

/// Returns true when submitting `body` would change the prior state.
///
/// The planned content is read as the platform would echo it, merged over
/// the prior state, so keys the platform fills in on its own are not drift.
/// Optional keys dropped from the plan keep their prior value.
fn content_changed(
    prior: &PolicyDeclaration,
    planned: &PolicyDeclaration,
    body: &PatchPolicyBody,
) -> Result<bool, MappingError> {
    let configuration =
        parse_configuration(planned.kind(), &body.configuration_data, Some(&prior.configuration))?;
    let pointcuts = decode_pointcuts(body.pointcut_data.as_deref());
    Ok(configuration != prior.configuration || pointcuts != prior.pointcut_conditions)
}

/// Converts a remote failure into a policy error.
fn remote_failure(operation: Operation, asset_id: &str, err: &RemoteError) -> PolicyError {
    PolicyError::Remote {
        operation,
        asset_id: asset_id.to_string(),
        status: err.status,
        detail: err.detail().to_string(),
    }
}
