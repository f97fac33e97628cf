// crates/fleet-bootstrap-core/src/resolve.rs
// ============================================================================
// Module: Package Resolver
// Description: Package lookup and input template validation.
// Purpose: Produce a package whose single input can be mapped safely.
// Dependencies: crate::interfaces, crate::model, tracing
// ============================================================================

//! ## Overview
//! The resolver fetches the integration package by name and checks its
//! template shape once. The result is a [`ResolvedPackage`], which the
//! desired-state builder can consume without re-validating.
//! Invariants:
//! - A [`ResolvedPackage`] has exactly one policy template with exactly one
//!   input, and that input handles the expected input type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::info;

use crate::error::BootstrapError;
use crate::error::Operation;
use crate::interfaces::ControlPlane;
use crate::model::Package;
use crate::model::PackageRef;
use crate::model::TemplateInput;

// ============================================================================
// SECTION: Resolved Package
// ============================================================================

/// Package whose input template shape has been validated.
///
/// # Invariants
/// - `input` is the only input of the only policy template of `package`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package definition.
    package: Package,
    /// The single input template.
    input: TemplateInput,
}

impl ResolvedPackage {
    /// Validates the template shape of `package`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Shape`] unless the package declares exactly
    /// one policy template with exactly one input of type `input_type`.
    pub fn new(package: Package, input_type: &str) -> Result<Self, BootstrapError> {
        let shape_error = |detail: String| BootstrapError::Shape {
            operation: Operation::ResolvePackage,
            detail,
        };
        let [template] = package.policy_templates.as_slice() else {
            return Err(shape_error(format!(
                "package {}-{} declares {} policy templates, expected 1",
                package.name,
                package.version,
                package.policy_templates.len()
            )));
        };
        let [input] = template.inputs.as_slice() else {
            return Err(shape_error(format!(
                "package {}-{} declares {} inputs, expected 1",
                package.name,
                package.version,
                template.inputs.len()
            )));
        };
        if input.input_type != input_type {
            return Err(shape_error(format!(
                "package {}-{} input type is {}, expected {input_type}",
                package.name, package.version, input.input_type
            )));
        }
        let input = input.clone();
        Ok(Self {
            package,
            input,
        })
    }

    /// Returns the package definition.
    #[must_use]
    pub const fn package(&self) -> &Package {
        &self.package
    }

    /// Returns the single input template.
    #[must_use]
    pub const fn input(&self) -> &TemplateInput {
        &self.input
    }

    /// Returns the package reference stored on package policies.
    #[must_use]
    pub fn package_ref(&self) -> PackageRef {
        PackageRef::from(&self.package)
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Fetches the package named `name` and validates its input template.
///
/// The first catalog entry whose name matches exactly is used.
///
/// # Errors
///
/// Returns [`BootstrapError::NotFound`] when no package matches,
/// [`BootstrapError::Shape`] when the template shape is unexpected, and
/// [`BootstrapError::ControlPlane`] when the lookup fails.
pub fn resolve_package<C>(
    control_plane: &C,
    name: &str,
    input_type: &str,
) -> Result<ResolvedPackage, BootstrapError>
where
    C: ControlPlane + ?Sized,
{
    let packages = control_plane
        .search_packages(name)
        .map_err(BootstrapError::control_plane(Operation::ResolvePackage))?;
    let package = packages.into_iter().find(|package| package.name == name).ok_or_else(|| {
        BootstrapError::NotFound {
            operation: Operation::ResolvePackage,
            detail: format!("no {name} package found"),
        }
    })?;
    info!(package = %package.name, version = %package.version, "package fetched");
    ResolvedPackage::new(package, input_type)
}
