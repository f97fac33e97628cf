// crates/fleet-bootstrap-core/src/lib.rs
// ============================================================================
// Module: Fleet Bootstrap Core
// Description: Discovery, desired-state, and reconciliation logic.
// Purpose: Converge a Fleet agent policy to one APM integration instance.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate holds the transport-free bootstrap logic. It discovers the
//! default agent policy, resolves the integration package, builds the desired
//! package policy, and reconciles existing instances against it. All
//! control-plane access goes through [`ControlPlane`], so the logic runs
//! unchanged against the HTTP client or an in-memory fake.
//! Invariants:
//! - Steps run strictly in order and the first error is terminal.
//! - After a successful run exactly one matching instance exists.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod desired;
pub mod discovery;
pub mod error;
pub mod interfaces;
pub mod model;
pub mod reconcile;
pub mod resolve;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::BootstrapPlan;
pub use bootstrap::BootstrapReport;
pub use bootstrap::bootstrap;
pub use desired::IntegrationSpec;
pub use desired::VarTable;
pub use desired::build_desired_policy;
pub use discovery::DefaultPolicyKind;
pub use discovery::RetryPolicy;
pub use discovery::find_default_policy;
pub use error::BootstrapError;
pub use error::Operation;
pub use interfaces::ControlPlane;
pub use interfaces::ControlPlaneError;
pub use interfaces::Sleeper;
pub use interfaces::ThreadSleeper;
pub use model::AgentPolicy;
pub use model::Package;
pub use model::PackagePolicy;
pub use model::PackagePolicyInput;
pub use model::PackageRef;
pub use model::PolicyTemplate;
pub use model::PolicyVar;
pub use model::TemplateInput;
pub use model::TemplateVar;
pub use model::VarValue;
pub use reconcile::Drift;
pub use reconcile::ReconcileOutcome;
pub use reconcile::SetupReason;
pub use reconcile::classify;
pub use reconcile::find_drift;
pub use reconcile::reconcile;
pub use resolve::ResolvedPackage;
pub use resolve::resolve_package;
