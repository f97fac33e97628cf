// crates/fleet-bootstrap-core/src/bootstrap.rs
// ============================================================================
// Module: Bootstrap Driver
// Description: End-to-end discovery, resolution, build, and reconciliation.
// Purpose: Run the whole convergence once, synchronously.
// Dependencies: crate::discovery, crate::resolve, crate::desired, crate::reconcile
// ============================================================================

//! ## Overview
//! [`bootstrap`] chains the components in their fixed order: discovery,
//! package resolution, desired-state construction, and reconciliation. The
//! first error ends the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::info;

use crate::desired::IntegrationSpec;
use crate::desired::VarTable;
use crate::desired::build_desired_policy;
use crate::discovery::DefaultPolicyKind;
use crate::discovery::RetryPolicy;
use crate::discovery::find_default_policy;
use crate::error::BootstrapError;
use crate::interfaces::ControlPlane;
use crate::interfaces::Sleeper;
use crate::model::AgentPolicy;
use crate::model::PackageRef;
use crate::reconcile::ReconcileOutcome;
use crate::reconcile::reconcile;
use crate::resolve::resolve_package;

// ============================================================================
// SECTION: Plan and Report
// ============================================================================

/// Everything the bootstrap needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct BootstrapPlan {
    /// Integration identity.
    pub integration: IntegrationSpec,
    /// Which default policy to target.
    pub default_policy: DefaultPolicyKind,
    /// Discovery retry budget.
    pub retry: RetryPolicy,
    /// Variable values to configure.
    pub vars: VarTable,
}

/// Summary of a successful bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    /// Agent policy the integration is attached to.
    pub policy: AgentPolicy,
    /// Package that was configured.
    pub package: PackageRef,
    /// Reconciliation result.
    pub outcome: ReconcileOutcome,
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Converges the default agent policy to the planned integration.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] raised by any step.
pub fn bootstrap<C, S>(
    control_plane: &C,
    sleeper: &S,
    plan: &BootstrapPlan,
) -> Result<BootstrapReport, BootstrapError>
where
    C: ControlPlane + ?Sized,
    S: Sleeper + ?Sized,
{
    let policy = find_default_policy(control_plane, sleeper, plan.default_policy, &plan.retry)?;
    let package = resolve_package(
        control_plane,
        &plan.integration.package_name,
        &plan.integration.input_type,
    )?;
    let desired = build_desired_policy(&policy.id, &package, &plan.integration, &plan.vars);
    let var_count: usize = desired.inputs.iter().map(|input| input.vars.len()).sum();
    info!(policy_id = %policy.id, vars = var_count, "desired package policy defined");
    let outcome = reconcile(control_plane, &policy.id, &desired)?;
    Ok(BootstrapReport {
        policy,
        package: package.package_ref(),
        outcome,
    })
}
