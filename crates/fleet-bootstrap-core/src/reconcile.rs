// crates/fleet-bootstrap-core/src/reconcile.rs
// ============================================================================
// Module: Package Policy Reconciler
// Description: Compares existing integration instances with the desired one.
// Purpose: Converge an agent policy to exactly one matching instance.
// Dependencies: crate::interfaces, crate::model, tracing
// ============================================================================

//! ## Overview
//! Reconciliation lists the package policies attached to an agent policy,
//! keeps those handling the target input type, and classifies them:
//! none means the integration is missing, one is compared field by field,
//! and more than one is never trusted. When setup is required every matched
//! instance is deleted and one instance is created from the desired state.
//! Invariants:
//! - Deletion always precedes creation; a failed step aborts without rollback.
//! - Every replaced instance is deleted by id; an instance without one aborts
//!   the run before any write.
//! - Comparison is tolerant of extra variables on the existing instance.
//! - An already converged policy triggers no write call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use tracing::info;

use crate::error::BootstrapError;
use crate::error::Operation;
use crate::interfaces::ControlPlane;
use crate::model::PackagePolicy;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Difference found between a single existing instance and the desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// The existing instance is disabled.
    Disabled,
    /// Namespaces differ.
    Namespace {
        /// Namespace found on the existing instance.
        found: String,
    },
    /// Package references differ.
    Package,
    /// The existing instance has no input of the desired type.
    InputMissing {
        /// Missing input type.
        input_type: String,
    },
    /// A desired variable is missing or has a different type or value.
    Variable {
        /// Variable name.
        name: String,
    },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("integration disabled"),
            Self::Namespace {
                found,
            } => write!(f, "namespace is {found}"),
            Self::Package => f.write_str("package reference differs"),
            Self::InputMissing {
                input_type,
            } => write!(f, "input {input_type} missing"),
            Self::Variable {
                name,
            } => write!(f, "variable {name} differs"),
        }
    }
}

/// Why the integration must be set up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupReason {
    /// No instance of the integration exists.
    Missing,
    /// The single existing instance differs from the desired one.
    Drifted(Drift),
    /// More than one instance exists.
    Duplicates {
        /// Number of matched instances.
        count: usize,
    },
}

impl fmt::Display for SetupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("agent policy has no integration"),
            Self::Drifted(drift) => write!(f, "existing integration drifted: {drift}"),
            Self::Duplicates {
                count,
            } => write!(f, "agent policy has {count} integrations"),
        }
    }
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The existing instance already matched; nothing was written.
    Unchanged {
        /// Identifier of the matching instance.
        id: Option<String>,
    },
    /// Matched instances were deleted and the desired one created.
    Replaced {
        /// Why setup was required.
        reason: SetupReason,
        /// Identifiers passed to the batch delete.
        deleted: Vec<String>,
        /// Instance returned by the control plane after creation.
        created: PackagePolicy,
    },
}

impl ReconcileOutcome {
    /// Returns true when the control plane was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Returns the KQL filter selecting package policies on `policy_id`.
#[must_use]
pub fn package_policies_kuery(policy_id: &str) -> String {
    format!("ingest-package-policies.policy_id:{policy_id}")
}

/// Returns true when `existing` handles any input type of `desired`.
#[must_use]
pub fn targets_integration(existing: &PackagePolicy, desired: &PackagePolicy) -> bool {
    desired.inputs.iter().any(|input| existing.has_input_type(&input.input_type))
}

/// Compares one existing instance with the desired instance.
///
/// Every desired variable must be present on the matching existing input
/// with the same type and value; extra variables are ignored.
#[must_use]
pub fn find_drift(existing: &PackagePolicy, desired: &PackagePolicy) -> Option<Drift> {
    if !existing.enabled {
        return Some(Drift::Disabled);
    }
    if existing.namespace != desired.namespace {
        return Some(Drift::Namespace {
            found: existing.namespace.clone(),
        });
    }
    if existing.package != desired.package {
        return Some(Drift::Package);
    }
    for desired_input in &desired.inputs {
        let Some(existing_input) = existing.input(&desired_input.input_type) else {
            return Some(Drift::InputMissing {
                input_type: desired_input.input_type.clone(),
            });
        };
        for (name, expected) in &desired_input.vars {
            if existing_input.vars.get(name) != Some(expected) {
                return Some(Drift::Variable {
                    name: name.clone(),
                });
            }
        }
    }
    None
}

/// Classifies the matched instances; `None` means no setup is required.
#[must_use]
pub fn classify(matched: &[PackagePolicy], desired: &PackagePolicy) -> Option<SetupReason> {
    match matched {
        [] => Some(SetupReason::Missing),
        [existing] => find_drift(existing, desired).map(SetupReason::Drifted),
        _ => Some(SetupReason::Duplicates {
            count: matched.len(),
        }),
    }
}

// ============================================================================
// SECTION: Reconciliation
// ============================================================================

/// Converges `policy_id` to exactly one instance equal to `desired`.
///
/// # Errors
///
/// Returns [`BootstrapError::ControlPlane`] tagged with the failing step when
/// listing, deleting, or creating fails, and [`BootstrapError::Shape`] when a
/// matched instance that must be replaced carries no id. No rollback is
/// attempted.
pub fn reconcile<C>(
    control_plane: &C,
    policy_id: &str,
    desired: &PackagePolicy,
) -> Result<ReconcileOutcome, BootstrapError>
where
    C: ControlPlane + ?Sized,
{
    let existing = control_plane
        .package_policies(&package_policies_kuery(policy_id))
        .map_err(BootstrapError::control_plane(Operation::ListPackagePolicies))?;
    let matched: Vec<PackagePolicy> =
        existing.into_iter().filter(|policy| targets_integration(policy, desired)).collect();
    info!(policy_id, matched = matched.len(), "existing integrations fetched");

    let Some(reason) = classify(&matched, desired) else {
        info!(policy_id, "integration does not require setup");
        return Ok(ReconcileOutcome::Unchanged {
            id: matched.into_iter().next().and_then(|policy| policy.id),
        });
    };
    info!(policy_id, reason = %reason, "integration requires setup");

    let unidentified = matched.iter().filter(|policy| policy.id.is_none()).count();
    if unidentified > 0 {
        return Err(BootstrapError::Shape {
            operation: Operation::ListPackagePolicies,
            detail: format!(
                "{unidentified} of {} matched package policies have no id",
                matched.len()
            ),
        });
    }
    let deleted: Vec<String> = matched.into_iter().filter_map(|policy| policy.id).collect();
    if !deleted.is_empty() {
        control_plane
            .delete_package_policies(&deleted)
            .map_err(BootstrapError::control_plane(Operation::DeletePackagePolicies))?;
        info!(policy_id, ids = %deleted.join(","), "existing integrations deleted");
    }
    let created = control_plane
        .create_package_policy(desired)
        .map_err(BootstrapError::control_plane(Operation::CreatePackagePolicy))?;
    info!(
        policy_id,
        id = created.id.as_deref().unwrap_or_default(),
        "integration successfully added to agent policy"
    );
    Ok(ReconcileOutcome::Replaced {
        reason,
        deleted,
        created,
    })
}
