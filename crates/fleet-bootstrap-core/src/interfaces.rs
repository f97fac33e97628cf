// crates/fleet-bootstrap-core/src/interfaces.rs
// ============================================================================
// Module: Fleet Bootstrap Interfaces
// Description: Backend-agnostic seams for the control plane and for sleeping.
// Purpose: Keep discovery and reconciliation free of HTTP and wall-clock time.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! The bootstrap logic talks to the Fleet control plane only through
//! [`ControlPlane`] and waits between discovery attempts only through
//! [`Sleeper`]. Production code plugs in the HTTP client and
//! [`ThreadSleeper`]; tests plug in recording fakes.
//! Invariants:
//! - Implementations do not retry; retry policy belongs to callers.
//! - Every call is synchronous and runs to completion before the next starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::model::AgentPolicy;
use crate::model::Package;
use crate::model::PackagePolicy;

// ============================================================================
// SECTION: Control Plane
// ============================================================================

/// Errors reported by a control-plane implementation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `RequestFailed::body` is the raw response body, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    /// Network level failure (DNS, connection refused, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The control plane answered with a non-2xx status.
    #[error("request failed ({status}): {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// A 2xx response did not match the expected document shape.
    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl ControlPlaneError {
    /// Returns true for network level failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Fleet control-plane operations needed by the bootstrap.
pub trait ControlPlane {
    /// Lists agent policies matching a KQL filter.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the request fails.
    fn agent_policies(&self, kuery: &str) -> Result<Vec<AgentPolicy>, ControlPlaneError>;

    /// Searches the package catalog by package name, experimental packages included.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the request fails.
    fn search_packages(&self, name: &str) -> Result<Vec<Package>, ControlPlaneError>;

    /// Lists package policies matching a KQL filter.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the request fails.
    fn package_policies(&self, kuery: &str) -> Result<Vec<PackagePolicy>, ControlPlaneError>;

    /// Creates a package policy and returns the stored instance.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the request fails.
    fn create_package_policy(
        &self,
        policy: &PackagePolicy,
    ) -> Result<PackagePolicy, ControlPlaneError>;

    /// Deletes package policies by id. An empty id list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the request fails.
    fn delete_package_policies(&self, ids: &[String]) -> Result<(), ControlPlaneError>;
}

// ============================================================================
// SECTION: Sleeper
// ============================================================================

/// Blocks the current thread between polling attempts.
pub trait Sleeper {
    /// Sleeps for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
