// crates/fleet-bootstrap-core/src/discovery.rs
// ============================================================================
// Module: Default Policy Discovery
// Description: Bounded polling for the default agent policy.
// Purpose: Wait for the control plane to create its default policy.
// Dependencies: crate::interfaces, crate::model, tracing
// ============================================================================

//! ## Overview
//! The default agent policy may not exist yet when the bootstrap starts, so
//! discovery polls with a fixed interval until a policy appears or the
//! attempt budget runs out.
//! Invariants:
//! - At most `max_attempts` queries are issued.
//! - The sleeper runs only between attempts, never after the last one.
//! - When several default policies are returned, the first one wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::BootstrapError;
use crate::error::Operation;
use crate::interfaces::ControlPlane;
use crate::interfaces::ControlPlaneError;
use crate::interfaces::Sleeper;
use crate::model::AgentPolicy;

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Fixed-interval retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Attempts used by default.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
    /// Pause used by default.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}

// ============================================================================
// SECTION: Default Policy Kind
// ============================================================================

/// Which default flag identifies the target policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicyKind {
    /// Policy new agents join (`is_default`).
    #[default]
    Agent,
    /// Policy Fleet Server agents join (`is_default_fleet_server`).
    FleetServer,
}

impl DefaultPolicyKind {
    /// Selects the kind from the fleet-server flag.
    #[must_use]
    pub const fn from_fleet_server_flag(fleet_server: bool) -> Self {
        if fleet_server { Self::FleetServer } else { Self::Agent }
    }

    /// Returns the agent policy attribute that marks the default.
    #[must_use]
    pub const fn flag_field(self) -> &'static str {
        match self {
            Self::Agent => "is_default",
            Self::FleetServer => "is_default_fleet_server",
        }
    }

    /// Returns the KQL filter selecting default policies of this kind.
    #[must_use]
    pub fn kuery(self) -> String {
        format!("ingest-agent-policies.{}:true", self.flag_field())
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Polls the control plane until a default agent policy exists.
///
/// Transport failures count as empty attempts because the control plane may
/// still be starting; any other control-plane error ends discovery at once.
///
/// # Errors
///
/// Returns [`BootstrapError::NotFound`] when the attempt budget is exhausted
/// and [`BootstrapError::ControlPlane`] on a non-transport failure.
pub fn find_default_policy<C, S>(
    control_plane: &C,
    sleeper: &S,
    kind: DefaultPolicyKind,
    retry: &RetryPolicy,
) -> Result<AgentPolicy, BootstrapError>
where
    C: ControlPlane + ?Sized,
    S: Sleeper + ?Sized,
{
    let kuery = kind.kuery();
    let mut last_transport_error: Option<ControlPlaneError> = None;
    for attempt in 1..=retry.max_attempts {
        match control_plane.agent_policies(&kuery) {
            Ok(policies) => {
                let count = policies.len();
                if let Some(policy) = policies.into_iter().next() {
                    if count > 1 {
                        warn!(count, policy_id = %policy.id, "multiple default agent policies, using the first");
                    }
                    info!(policy_id = %policy.id, attempt, "default agent policy fetched");
                    return Ok(policy);
                }
                debug!(attempt, flag = kind.flag_field(), "no default agent policy yet");
            }
            Err(err) if err.is_transport() => {
                warn!(attempt, error = %err, "control plane unreachable while polling for default policy");
                last_transport_error = Some(err);
            }
            Err(err) => return Err(BootstrapError::control_plane(Operation::FindDefaultPolicy)(err)),
        }
        if attempt < retry.max_attempts {
            sleeper.sleep(retry.interval);
        }
    }
    let detail = match last_transport_error {
        Some(err) => format!(
            "no default agent policy ({}) after {} attempts; last error: {err}",
            kind.flag_field(),
            retry.max_attempts
        ),
        None => format!(
            "no default agent policy ({}) after {} attempts",
            kind.flag_field(),
            retry.max_attempts
        ),
    };
    Err(BootstrapError::NotFound {
        operation: Operation::FindDefaultPolicy,
        detail,
    })
}
