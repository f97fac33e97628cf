// crates/fleet-bootstrap-core/src/model.rs
// ============================================================================
// Module: Fleet Data Model
// Description: Agent policies, packages, and package policy wire types.
// Purpose: Provide typed views of the control-plane JSON documents.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! These types mirror the JSON documents exchanged with the Fleet control
//! plane. Fields the bootstrap never inspects are ignored on decode, so newer
//! control-plane versions can add fields without breaking reconciliation.
//! Invariants:
//! - [`PackagePolicy::id`] is `None` until the control plane assigns one and is
//!   never serialized when absent.
//! - Variable maps are ordered ([`BTreeMap`]) so encoded payloads are stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Agent Policies
// ============================================================================

/// Named configuration group that agents enroll into.
///
/// # Invariants
/// - `id` is assigned by the control plane; the bootstrap only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPolicy {
    /// Control-plane identifier.
    pub id: String,
    /// Display name, when reported.
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// SECTION: Packages
// ============================================================================

/// Installable integration definition sourced from a package catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name (for example `apm`).
    pub name: String,
    /// Package version.
    pub version: String,
    /// Human readable title.
    #[serde(default)]
    pub title: String,
    /// Policy templates declared by the package.
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_templates: Vec<PolicyTemplate>,
}

/// Policy template declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTemplate {
    /// Template name.
    #[serde(default)]
    pub name: String,
    /// Input templates.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<TemplateInput>,
}

/// Input template: the protocol an input handles and the variables it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInput {
    /// Input type handled by the agent (for example `apm`).
    #[serde(rename = "type")]
    pub input_type: String,
    /// Human readable title.
    #[serde(default)]
    pub title: String,
    /// Declared variables in package order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vars: Vec<TemplateVar>,
}

/// Variable declaration on an input template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVar {
    /// Variable name.
    pub name: String,
    /// Declared value type (`text`, `bool`, `yaml`, ...).
    #[serde(rename = "type")]
    pub var_type: String,
}

// ============================================================================
// SECTION: Package Policies
// ============================================================================

/// Reference from a package policy to the package it instantiates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Package title.
    #[serde(default)]
    pub title: String,
}

impl From<&Package> for PackageRef {
    fn from(package: &Package) -> Self {
        Self {
            name: package.name.clone(),
            version: package.version.clone(),
            title: package.title.clone(),
        }
    }
}

/// Integration instance: a package attached to an agent policy.
///
/// # Invariants
/// - `id` is present only on instances read back from the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePolicy {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Instance name.
    pub name: String,
    /// Data stream namespace.
    #[serde(default)]
    pub namespace: String,
    /// Whether the instance is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Owning agent policy identifier.
    #[serde(default)]
    pub policy_id: String,
    /// Package reference.
    #[serde(default)]
    pub package: PackageRef,
    /// Configured inputs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<PackagePolicyInput>,
}

impl PackagePolicy {
    /// Returns the first input handling `input_type`.
    #[must_use]
    pub fn input(&self, input_type: &str) -> Option<&PackagePolicyInput> {
        self.inputs.iter().find(|input| input.input_type == input_type)
    }

    /// Returns true when any input handles `input_type`.
    #[must_use]
    pub fn has_input_type(&self, input_type: &str) -> bool {
        self.input(input_type).is_some()
    }
}

/// Configured input on a package policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePolicyInput {
    /// Input type.
    #[serde(rename = "type")]
    pub input_type: String,
    /// Whether the input is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Data stream placeholders, passed through untouched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub streams: Vec<Value>,
    /// Variables keyed by name.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, PolicyVar>,
}

/// Typed variable entry: `{type, value}`.
///
/// # Invariants
/// - `value` is omitted from the encoded form when `None`, leaving the control
///   plane's own default in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyVar {
    /// Declared value type copied from the package.
    #[serde(rename = "type", default)]
    pub var_type: String,
    /// Resolved value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VarValue>,
}

impl PolicyVar {
    /// Creates a variable entry.
    #[must_use]
    pub fn new(var_type: impl Into<String>, value: Option<VarValue>) -> Self {
        Self {
            var_type: var_type.into(),
            value,
        }
    }
}

/// Variable value.
///
/// The bootstrap only ever produces [`VarValue::Bool`] and [`VarValue::Text`].
/// [`VarValue::Other`] holds values the control plane reports for variables
/// this bootstrap does not configure (numbers, lists, objects) so decoding
/// an existing instance never fails; it compares structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// Boolean value.
    Bool(bool),
    /// String value.
    Text(String),
    /// Any other JSON value reported by the control plane.
    Other(Value),
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "\"{value}\""),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
