// crates/fleet-bootstrap-core/src/desired.rs
// ============================================================================
// Module: Desired State Builder
// Description: Computes the target package policy from package metadata.
// Purpose: Single source of truth for what the bootstrap configures.
// Dependencies: crate::model, crate::resolve
// ============================================================================

//! ## Overview
//! [`build_desired_policy`] is a pure function: given the discovered policy
//! id, a [`ResolvedPackage`], the integration settings, and a [`VarTable`],
//! it returns the fully specified package policy the reconciler converges to.
//! Extending what the bootstrap configures means adding an entry to the
//! [`VarTable`]; control flow does not change.
//! Invariants:
//! - Every variable the package declares appears in the result with the
//!   declared type.
//! - Variables absent from the table carry no value, so the control plane
//!   applies its own default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::model::PackagePolicy;
use crate::model::PackagePolicyInput;
use crate::model::PolicyVar;
use crate::model::VarValue;
use crate::resolve::ResolvedPackage;

// ============================================================================
// SECTION: Integration Settings
// ============================================================================

/// Fixed identity of the integration instance the bootstrap manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSpec {
    /// Package to install.
    pub package_name: String,
    /// Input type that identifies instances of this integration.
    pub input_type: String,
    /// Name given to the created instance.
    pub instance_name: String,
    /// Data stream namespace.
    pub namespace: String,
}

impl IntegrationSpec {
    /// APM integration settings used by the test environment.
    #[must_use]
    pub fn apm() -> Self {
        Self {
            package_name: "apm".to_string(),
            input_type: "apm".to_string(),
            instance_name: "apm-integration-testing".to_string(),
            namespace: "default".to_string(),
        }
    }
}

impl Default for IntegrationSpec {
    fn default() -> Self {
        Self::apm()
    }
}

// ============================================================================
// SECTION: Variable Table
// ============================================================================

/// Well-known variable names mapped to the values the bootstrap sets.
#[derive(Clone, Default, PartialEq)]
pub struct VarTable {
    /// Values keyed by variable name.
    values: BTreeMap<String, VarValue>,
}

impl VarTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// APM server defaults: bind address, RUM enabled, and the secret token.
    #[must_use]
    pub fn apm(secret_token: &str) -> Self {
        Self::new()
            .with("host", "0.0.0.0:8200")
            .with("enable_rum", true)
            .with("secret_token", secret_token)
    }

    /// Adds or replaces a value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Returns the value configured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.values.get(name)
    }

    /// Returns the configured variable names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for VarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values may hold secrets.
        f.debug_struct("VarTable").field("names", &self.values.keys().collect::<Vec<_>>()).finish()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the desired package policy for `policy_id`.
#[must_use]
pub fn build_desired_policy(
    policy_id: &str,
    package: &ResolvedPackage,
    integration: &IntegrationSpec,
    vars: &VarTable,
) -> PackagePolicy {
    let input = package.input();
    let vars = input
        .vars
        .iter()
        .map(|declared| {
            let value = vars.get(&declared.name).cloned();
            (declared.name.clone(), PolicyVar::new(declared.var_type.clone(), value))
        })
        .collect();
    PackagePolicy {
        id: None,
        name: integration.instance_name.clone(),
        namespace: integration.namespace.clone(),
        enabled: true,
        policy_id: policy_id.to_string(),
        package: package.package_ref(),
        inputs: vec![PackagePolicyInput {
            input_type: input.input_type.clone(),
            enabled: true,
            streams: Vec::new(),
            vars,
        }],
    }
}
