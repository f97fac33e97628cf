// crates/fleet-bootstrap-client/src/lib.rs
// ============================================================================
// Module: Fleet Bootstrap Client
// Description: Blocking HTTP control plane for the Fleet API.
// Purpose: Implement the core control-plane seam over HTTP.
// Dependencies: fleet-bootstrap-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! [`FleetClient`] implements [`fleet_bootstrap_core::ControlPlane`] against
//! the Fleet REST API, with the package catalog served either by Fleet itself
//! or by a package registry ([`PackageCatalog`]).
//! Invariants:
//! - Every request carries `kbn-xsrf` and a JSON content type.
//! - Credentials embedded in the base URL are sent as basic auth and never
//!   appear in logged URLs.
//! - Non-2xx responses map to `RequestFailed` with the raw body; the client
//!   never retries.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientError;
pub use client::FleetClient;
pub use client::FleetClientConfig;
pub use client::PackageCatalog;
