// crates/fleet-bootstrap-cli/src/lib.rs
// ============================================================================
// Module: Fleet Bootstrap CLI Support
// Description: Logging setup and the passthrough proxy used by the binary.
// Purpose: Keep the binary entry point thin and its pieces testable.
// Dependencies: axum, reqwest, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `fleet-bootstrap` binary installs logging ([`telemetry`]), runs the
//! bootstrap once, and then forwards traffic to the downstream server
//! ([`proxy`]).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod proxy;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use proxy::ProxyError;
pub use proxy::proxy_router;
pub use proxy::serve_proxy;
pub use telemetry::TelemetryError;
pub use telemetry::init_tracing;
