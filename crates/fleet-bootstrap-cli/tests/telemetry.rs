// crates/fleet-bootstrap-cli/tests/telemetry.rs
// ============================================================================
// Module: Telemetry Tests
// Description: Log filter resolution.
// ============================================================================
//! ## Overview
//! Validates the fallback behavior of the `RUST_LOG` filter.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use fleet_bootstrap_cli::telemetry::DEFAULT_LOG_FILTER;
use fleet_bootstrap_cli::telemetry::env_filter;

/// Tests that missing or blank values fall back to the default filter.
#[test]
fn env_filter_defaults_to_info() {
    assert_eq!(env_filter(None).to_string(), DEFAULT_LOG_FILTER);
    assert_eq!(env_filter(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
}

/// Tests that valid directives are used as given.
#[test]
fn env_filter_honors_directives() {
    assert_eq!(env_filter(Some("fleet_bootstrap_core=debug")).to_string(), "fleet_bootstrap_core=debug");
}

/// Tests that invalid directives fall back to the default filter.
#[test]
fn env_filter_rejects_invalid_directives() {
    assert_eq!(env_filter(Some("fleet_bootstrap_core=loud")).to_string(), DEFAULT_LOG_FILTER);
}
