// crates/fleet-bootstrap-core/src/error.rs
// ============================================================================
// Module: Bootstrap Errors
// Description: Terminal error taxonomy for the bootstrap run.
// Purpose: Tag every failure with the operation that produced it.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Every bootstrap error is terminal. Errors carry the [`Operation`] that
//! failed so a single log line is enough to locate the failing step.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::interfaces::ControlPlaneError;

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Bootstrap step that produced an error.
///
/// # Invariants
/// - Labels are stable snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Default agent policy discovery.
    FindDefaultPolicy,
    /// Package lookup and template validation.
    ResolvePackage,
    /// Listing package policies on the agent policy.
    ListPackagePolicies,
    /// Batch deletion of package policies.
    DeletePackagePolicies,
    /// Creation of the desired package policy.
    CreatePackagePolicy,
}

impl Operation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FindDefaultPolicy => "find_default_policy",
            Self::ResolvePackage => "resolve_package",
            Self::ListPackagePolicies => "list_package_policies",
            Self::DeletePackagePolicies => "delete_package_policies",
            Self::CreatePackagePolicy => "create_package_policy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Bootstrap Error
// ============================================================================

/// Terminal bootstrap failure.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - The wrapped [`ControlPlaneError`] kind is never rewritten.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A control-plane call failed.
    #[error("{operation}: {source}")]
    ControlPlane {
        /// Failing operation.
        operation: Operation,
        /// Underlying control-plane error.
        #[source]
        source: ControlPlaneError,
    },
    /// A required resource does not exist.
    #[error("{operation}: not found: {detail}")]
    NotFound {
        /// Failing operation.
        operation: Operation,
        /// What was missing.
        detail: String,
    },
    /// A control-plane document does not have the expected shape.
    #[error("{operation}: unexpected shape: {detail}")]
    Shape {
        /// Failing operation.
        operation: Operation,
        /// Shape mismatch description.
        detail: String,
    },
}

impl BootstrapError {
    /// Returns the operation that failed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ControlPlane {
                operation, ..
            }
            | Self::NotFound {
                operation, ..
            }
            | Self::Shape {
                operation, ..
            } => *operation,
        }
    }

    /// Returns a mapper that wraps control-plane errors for `operation`.
    pub(crate) fn control_plane(operation: Operation) -> impl FnOnce(ControlPlaneError) -> Self {
        move |source| Self::ControlPlane {
            operation,
            source,
        }
    }
}
