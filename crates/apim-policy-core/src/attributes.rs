// crates/apim-policy-core/src/attributes.rs
// ============================================================================
// Module: Attribute Bag Adapter
// Description: Framework-facing attribute bag and resource entry points.
// Purpose: Map flat snake_case state onto typed declarations and back.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Host frameworks exchange resource state as a flat [`AttributeBag`] of
//! snake_case keys and JSON values. [`PolicyResource`] adapts the typed
//! [`PolicyLifecycle`] to that shape and reports failures as
//! [`Diagnostics`].
//!
//! Bag layout:
//! - identity: `org_id`, `env_id`, `api_instance_id`;
//! - asset: `asset_group_id`, `asset_id`, `asset_version`;
//! - `configuration`: object for known policy types;
//! - `configuration_data`: JSON text (or object) for custom policies;
//! - `pointcut_conditions`: list of `{http_methods, uri_template_regex}`;
//! - `disabled`, and the read-only `id`, `order`, `policy_template_id`,
//!   `master_organization_id`, `audit`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::configuration::CustomPolicyConfig;
use crate::configuration::PolicyConfiguration;
use crate::configuration::PolicyKind;
use crate::configuration::json_type_name;
use crate::diagnostics::Diagnostics;
use crate::error::MappingError;
use crate::error::PolicyError;
use crate::identifiers::PolicyId;
use crate::interfaces::AuthProvider;
use crate::interfaces::PolicyOperations;
use crate::lifecycle::PolicyLifecycle;
use crate::model::AssetCoordinates;
use crate::model::PolicyAudit;
use crate::model::PolicyDeclaration;
use crate::model::PolicyScope;
use crate::model::RemoteAttributes;
use crate::pointcut::PointcutCondition;
use crate::validation::validate_declaration;

// ============================================================================
// SECTION: Attribute Keys
// ============================================================================

/// Typed configuration key.
const CONFIGURATION: &str = "configuration";
/// Custom configuration key.
const CONFIGURATION_DATA: &str = "configuration_data";
/// Pointcut list key.
const POINTCUT_CONDITIONS: &str = "pointcut_conditions";

// ============================================================================
// SECTION: Attribute Bag
// ============================================================================

/// Flat resource state exchanged with host frameworks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(Map<String, Value>);

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps an existing attribute map.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the attribute map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets an attribute value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Maps the bag onto a typed declaration.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when an attribute has the wrong shape or the
    /// custom configuration is not a JSON object.
    pub fn to_declaration(&self) -> Result<PolicyDeclaration, MappingError> {
        let scope = PolicyScope {
            org_id: self.string("org_id")?,
            env_id: self.string("env_id")?,
            api_instance_id: self.string("api_instance_id")?,
        };
        let asset = AssetCoordinates {
            asset_group_id: self.string("asset_group_id")?,
            asset_id: self.string("asset_id")?,
            asset_version: self.string("asset_version")?,
        };
        let kind = PolicyKind::from_asset(&asset.asset_group_id, &asset.asset_id);
        let configuration = self.configuration(kind)?;
        let id = self.optional_string("id")?.map(PolicyId::new);
        let audit = match self.present("audit") {
            Some(value) => Some(
                serde_json::from_value::<PolicyAudit>(value.clone())
                    .map_err(|err| MappingError::new("audit", err.to_string()))?,
            ),
            None => None,
        };
        Ok(PolicyDeclaration {
            scope,
            asset,
            configuration,
            pointcut_conditions: self.pointcuts()?,
            disabled: self.boolean("disabled")?,
            id,
            remote: RemoteAttributes {
                order: self.present("order").and_then(Value::as_i64),
                policy_template_id: self.optional_string("policy_template_id")?,
                master_organization_id: self.optional_string("master_organization_id")?,
                audit,
            },
        })
    }

    /// Renders a declaration as a bag.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the configuration cannot be serialized.
    pub fn from_declaration(declaration: &PolicyDeclaration) -> Result<Self, MappingError> {
        let mut bag = Self::new();
        if let Some(id) = &declaration.id {
            bag.insert("id", Value::String(id.to_string()));
        }
        bag.insert("org_id", Value::String(declaration.scope.org_id.clone()));
        bag.insert("env_id", Value::String(declaration.scope.env_id.clone()));
        bag.insert("api_instance_id", Value::String(declaration.scope.api_instance_id.clone()));
        bag.insert("asset_group_id", Value::String(declaration.asset.asset_group_id.clone()));
        bag.insert("asset_id", Value::String(declaration.asset.asset_id.clone()));
        bag.insert("asset_version", Value::String(declaration.asset.asset_version.clone()));
        match &declaration.configuration {
            PolicyConfiguration::Custom(config) => {
                bag.insert(CONFIGURATION_DATA, Value::String(config.to_json_text()));
            }
            typed => {
                let local = typed.to_local_map()?;
                let present = local.into_iter().filter(|(_, value)| !value.is_null()).collect();
                bag.insert(CONFIGURATION, Value::Object(present));
            }
        }
        let pointcuts = serde_json::to_value(&declaration.pointcut_conditions)
            .map_err(|err| MappingError::new(POINTCUT_CONDITIONS, err.to_string()))?;
        bag.insert(POINTCUT_CONDITIONS, pointcuts);
        bag.insert("disabled", Value::Bool(declaration.disabled));
        let remote = &declaration.remote;
        if let Some(order) = remote.order {
            bag.insert("order", Value::from(order));
        }
        if let Some(template) = &remote.policy_template_id {
            bag.insert("policy_template_id", Value::String(template.clone()));
        }
        if let Some(master) = &remote.master_organization_id {
            bag.insert("master_organization_id", Value::String(master.clone()));
        }
        if let Some(audit) = &remote.audit {
            let audit = serde_json::to_value(audit)
                .map_err(|err| MappingError::new("audit", err.to_string()))?;
            bag.insert("audit", audit);
        }
        Ok(bag)
    }

    // ========================================================================
    // SECTION: Attribute Readers
    // ========================================================================

    /// Returns a non-null attribute.
    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Reads a string attribute; absent reads as empty.
    fn string(&self, key: &str) -> Result<String, MappingError> {
        Ok(self.optional_string(key)?.unwrap_or_default())
    }

    /// Reads an optional string attribute; numbers are accepted.
    fn optional_string(&self, key: &str) -> Result<Option<String>, MappingError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Number(value)) => Ok(Some(value.to_string())),
            Some(other) => Err(MappingError::new(
                key,
                format!("expected a string, got {}", json_type_name(other)),
            )),
        }
    }

    /// Reads a boolean attribute; absent reads as false.
    fn boolean(&self, key: &str) -> Result<bool, MappingError> {
        match self.present(key) {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(MappingError::new(
                key,
                format!("expected a boolean, got {}", json_type_name(other)),
            )),
        }
    }

    /// Reads the configuration for `kind`.
    fn configuration(&self, kind: PolicyKind) -> Result<PolicyConfiguration, MappingError> {
        if kind == PolicyKind::Custom {
            let config = match self.present(CONFIGURATION_DATA).or_else(|| self.present(CONFIGURATION)) {
                None => CustomPolicyConfig::default(),
                Some(Value::String(text)) => CustomPolicyConfig::from_json_text(text)?,
                Some(value) => CustomPolicyConfig::from_value(value.clone())?,
            };
            return Ok(PolicyConfiguration::Custom(config));
        }
        let local = match self.present(CONFIGURATION) {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(MappingError::new(
                    CONFIGURATION,
                    format!("expected an object, got {}", json_type_name(other)),
                ));
            }
        };
        PolicyConfiguration::from_local_map(kind, local)
    }

    /// Reads pointcut conditions, upper-casing methods.
    fn pointcuts(&self) -> Result<Vec<PointcutCondition>, MappingError> {
        let Some(value) = self.present(POINTCUT_CONDITIONS) else {
            return Ok(Vec::new());
        };
        let conditions: Vec<PointcutCondition> = serde_json::from_value(value.clone())
            .map_err(|err| MappingError::new(POINTCUT_CONDITIONS, err.to_string()))?;
        Ok(conditions
            .into_iter()
            .map(|condition| PointcutCondition {
                http_methods: condition
                    .http_methods
                    .iter()
                    .map(|method| method.trim().to_ascii_uppercase())
                    .collect(),
                uri_template_regex: condition.uri_template_regex,
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Validation Entry Point
// ============================================================================

/// Maps and validates a planned bag without any remote call.
///
/// # Errors
///
/// Returns [`Diagnostics`] describing every mapping or validation failure.
pub fn validate_attributes(planned: &AttributeBag) -> Result<PolicyDeclaration, Diagnostics> {
    let declaration = planned.to_declaration().map_err(|err| PolicyError::from(err).diagnostics())?;
    validate_declaration(&declaration).map_err(|errors| PolicyError::from(errors).diagnostics())?;
    Ok(declaration)
}

// ============================================================================
// SECTION: Resource
// ============================================================================

/// Resource entry points over attribute bags.
pub struct PolicyResource<O, A> {
    /// Typed lifecycle orchestrator.
    lifecycle: PolicyLifecycle<O, A>,
}

impl<O, A> PolicyResource<O, A>
where
    O: PolicyOperations,
    A: AuthProvider,
{
    /// Wraps a lifecycle orchestrator.
    #[must_use]
    pub const fn new(lifecycle: PolicyLifecycle<O, A>) -> Self {
        Self {
            lifecycle,
        }
    }

    /// Returns the lifecycle orchestrator.
    pub const fn lifecycle(&self) -> &PolicyLifecycle<O, A> {
        &self.lifecycle
    }

    /// Creates the planned policy and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`Diagnostics`] on any failure.
    pub fn create(&self, planned: &AttributeBag) -> Result<AttributeBag, Diagnostics> {
        let declaration = planned.to_declaration().map_err(mapping_diagnostics)?;
        let state = self.lifecycle.create(&declaration).map_err(|err| err.diagnostics())?;
        AttributeBag::from_declaration(&state).map_err(mapping_diagnostics)
    }

    /// Refreshes state; `None` means the policy is gone.
    ///
    /// # Errors
    ///
    /// Returns [`Diagnostics`] on any failure.
    pub fn read(&self, state: &AttributeBag) -> Result<Option<AttributeBag>, Diagnostics> {
        let declaration = state.to_declaration().map_err(mapping_diagnostics)?;
        match self.lifecycle.read(&declaration).map_err(|err| err.diagnostics())? {
            Some(refreshed) => AttributeBag::from_declaration(&refreshed).map(Some).map_err(mapping_diagnostics),
            None => Ok(None),
        }
    }

    /// Applies the planned bag over the stored state.
    ///
    /// The read-only `id` is carried from `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Diagnostics`] on any failure.
    pub fn update(&self, state: &AttributeBag, planned: &AttributeBag) -> Result<AttributeBag, Diagnostics> {
        let prior = state.to_declaration().map_err(mapping_diagnostics)?;
        let mut declaration = planned.to_declaration().map_err(mapping_diagnostics)?;
        declaration.id.clone_from(&prior.id);
        let refreshed = self.lifecycle.update(&prior, &declaration).map_err(|err| err.diagnostics())?;
        AttributeBag::from_declaration(&refreshed).map_err(mapping_diagnostics)
    }

    /// Deletes the policy recorded in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Diagnostics`] on any failure.
    pub fn delete(&self, state: &AttributeBag) -> Result<(), Diagnostics> {
        let mut declaration = state.to_declaration().map_err(mapping_diagnostics)?;
        self.lifecycle.delete(&mut declaration).map_err(|err| err.diagnostics())
    }

    /// Imports an existing policy from an `org/env/api/policy` id.
    ///
    /// # Errors
    ///
    /// Returns [`Diagnostics`] on any failure.
    pub fn import(&self, composite: &str) -> Result<AttributeBag, Diagnostics> {
        let state = self.lifecycle.import(composite).map_err(|err| err.diagnostics())?;
        AttributeBag::from_declaration(&state).map_err(mapping_diagnostics)
    }
}

/// Renders a mapping error as diagnostics.
fn mapping_diagnostics(err: MappingError) -> Diagnostics {
    PolicyError::Mapping(err).diagnostics()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
