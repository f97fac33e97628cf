// crates/fleet-bootstrap-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: In-memory control plane and recording sleeper.
// Purpose: Drive core logic without HTTP or wall-clock time.
// Dependencies: fleet-bootstrap-core
// ============================================================================

//! ## Overview
//! [`FakeControlPlane`] keeps package policies in memory, records every call
//! in order, and can be scripted to fail individual operations.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use fleet_bootstrap_core::AgentPolicy;
use fleet_bootstrap_core::ControlPlane;
use fleet_bootstrap_core::ControlPlaneError;
use fleet_bootstrap_core::IntegrationSpec;
use fleet_bootstrap_core::Package;
use fleet_bootstrap_core::PackagePolicy;
use fleet_bootstrap_core::PolicyTemplate;
use fleet_bootstrap_core::ResolvedPackage;
use fleet_bootstrap_core::Sleeper;
use fleet_bootstrap_core::TemplateInput;
use fleet_bootstrap_core::TemplateVar;
use fleet_bootstrap_core::VarTable;
use fleet_bootstrap_core::build_desired_policy;

// ============================================================================
// SECTION: Fake Control Plane
// ============================================================================

/// Control-plane call recorded by [`FakeControlPlane`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Agent policy query with its kuery.
    AgentPolicies(String),
    /// Package search by name.
    SearchPackages(String),
    /// Package policy listing with its kuery.
    ListPackagePolicies(String),
    /// Create request payload.
    Create(PackagePolicy),
    /// Batch delete ids.
    Delete(Vec<String>),
}

/// In-memory control plane.
#[derive(Default)]
pub struct FakeControlPlane {
    /// Scripted agent policy responses; an empty queue answers with no policies.
    pub agent_policy_responses: Mutex<VecDeque<Result<Vec<AgentPolicy>, ControlPlaneError>>>,
    /// Catalog search results.
    pub packages: Vec<Package>,
    /// Scripted package search failure.
    pub package_error: Option<ControlPlaneError>,
    /// Stored package policies.
    pub policies: Mutex<Vec<PackagePolicy>>,
    /// Scripted listing failure.
    pub list_error: Option<ControlPlaneError>,
    /// Scripted create failure.
    pub create_error: Option<ControlPlaneError>,
    /// Scripted delete failure.
    pub delete_error: Option<ControlPlaneError>,
    /// Calls in arrival order.
    pub calls: Mutex<Vec<Call>>,
    /// Last assigned id suffix.
    pub next_id: Mutex<u32>,
}

impl FakeControlPlane {
    /// Creates a control plane with one default policy and the APM package.
    pub fn ready(policy_id: &str) -> Self {
        let fake = Self {
            packages: vec![apm_package("8.0.0")],
            ..Self::default()
        };
        fake.push_agent_policies(Ok(vec![agent_policy(policy_id)]));
        fake
    }

    /// Queues one agent policy response.
    pub fn push_agent_policies(&self, response: Result<Vec<AgentPolicy>, ControlPlaneError>) {
        self.agent_policy_responses.lock().unwrap().push_back(response);
    }

    /// Replaces the stored package policies.
    pub fn with_policies(self, policies: Vec<PackagePolicy>) -> Self {
        *self.policies.lock().unwrap() = policies;
        self
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the stored package policies.
    pub fn stored(&self) -> Vec<PackagePolicy> {
        self.policies.lock().unwrap().clone()
    }

    /// Counts create calls.
    pub fn create_count(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, Call::Create(_))).count()
    }

    /// Returns the id lists of every delete call.
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    /// Appends `call` to the log.
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ControlPlane for FakeControlPlane {
    fn agent_policies(&self, kuery: &str) -> Result<Vec<AgentPolicy>, ControlPlaneError> {
        self.record(Call::AgentPolicies(kuery.to_string()));
        self.agent_policy_responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn search_packages(&self, name: &str) -> Result<Vec<Package>, ControlPlaneError> {
        self.record(Call::SearchPackages(name.to_string()));
        if let Some(err) = &self.package_error {
            return Err(err.clone());
        }
        Ok(self.packages.clone())
    }

    fn package_policies(&self, kuery: &str) -> Result<Vec<PackagePolicy>, ControlPlaneError> {
        self.record(Call::ListPackagePolicies(kuery.to_string()));
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        let policy_id = kuery.rsplit(':').next().unwrap_or_default();
        Ok(self
            .policies
            .lock()
            .unwrap()
            .iter()
            .filter(|policy| policy.policy_id == policy_id)
            .cloned()
            .collect())
    }

    fn create_package_policy(
        &self,
        policy: &PackagePolicy,
    ) -> Result<PackagePolicy, ControlPlaneError> {
        self.record(Call::Create(policy.clone()));
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let mut created = policy.clone();
        created.id = Some(format!("created-{next_id}"));
        self.policies.lock().unwrap().push(created.clone());
        Ok(created)
    }

    fn delete_package_policies(&self, ids: &[String]) -> Result<(), ControlPlaneError> {
        self.record(Call::Delete(ids.to_vec()));
        if let Some(err) = &self.delete_error {
            return Err(err.clone());
        }
        self.policies
            .lock()
            .unwrap()
            .retain(|policy| policy.id.as_ref().is_none_or(|id| !ids.contains(id)));
        Ok(())
    }
}

// ============================================================================
// SECTION: Recording Sleeper
// ============================================================================

/// Sleeper that records requested durations and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    /// Requested durations.
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Returns the requested durations.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Agent policy fixture.
pub fn agent_policy(id: &str) -> AgentPolicy {
    AgentPolicy {
        id: id.to_string(),
        name: format!("{id} policy"),
    }
}

/// APM package with one template, one `apm` input, and four declared vars.
pub fn apm_package(version: &str) -> Package {
    Package {
        name: "apm".to_string(),
        version: version.to_string(),
        title: "Elastic APM".to_string(),
        policy_templates: vec![PolicyTemplate {
            name: "apmserver".to_string(),
            inputs: vec![TemplateInput {
                input_type: "apm".to_string(),
                title: "Elastic APM Integration".to_string(),
                vars: vec![
                    template_var("host", "text"),
                    template_var("enable_rum", "bool"),
                    template_var("secret_token", "text"),
                    template_var("max_event_size", "integer"),
                ],
            }],
        }],
    }
}

/// Template variable fixture.
pub fn template_var(name: &str, var_type: &str) -> TemplateVar {
    TemplateVar {
        name: name.to_string(),
        var_type: var_type.to_string(),
    }
}

/// Validated APM package fixture.
pub fn resolved_apm(version: &str) -> ResolvedPackage {
    ResolvedPackage::new(apm_package(version), "apm").unwrap()
}

/// Desired APM package policy for `policy_id`.
pub fn desired_apm(policy_id: &str, secret_token: &str) -> PackagePolicy {
    build_desired_policy(
        policy_id,
        &resolved_apm("8.0.0"),
        &IntegrationSpec::apm(),
        &VarTable::apm(secret_token),
    )
}

/// Returns `policy` as the control plane would store it under `id`.
pub fn stored_as(policy: &PackagePolicy, id: &str) -> PackagePolicy {
    let mut stored = policy.clone();
    stored.id = Some(id.to_string());
    stored
}
