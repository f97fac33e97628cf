// crates/fleet-bootstrap-cli/src/telemetry.rs
// ============================================================================
// Module: Bootstrap Telemetry
// Description: Structured logging setup for the bootstrap binary.
// Purpose: Install one fmt subscriber filtered by RUST_LOG.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Logging goes through `tracing`. The binary installs a single `fmt` layer
//! filtered by `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`] when the
//! variable is unset or unparsable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging setup errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Builds the log filter from a raw `RUST_LOG` value.
#[must_use]
pub fn env_filter(raw: Option<&str>) -> EnvFilter {
    raw.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInstalled`] when called twice.
pub fn init_tracing() -> Result<(), TelemetryError> {
    let raw = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(env_filter(raw.as_deref()))
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}
