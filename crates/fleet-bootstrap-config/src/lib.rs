// crates/fleet-bootstrap-config/src/lib.rs
// ============================================================================
// Module: Fleet Bootstrap Config
// Description: Environment-driven configuration for the bootstrap binary.
// Purpose: Resolve and validate every setting once, before any I/O.
// Dependencies: fleet-bootstrap-core, thiserror, url
// ============================================================================

//! ## Overview
//! [`BootstrapConfig`] is read from environment variables through a lookup
//! function and validated eagerly. Components receive the values they need
//! from it explicitly; nothing reads the environment later.
//! Invariants:
//! - A constructed [`BootstrapConfig`] holds only http(s) URLs and a parsed
//!   listen address.
//! - The secret token never appears in `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BootstrapConfig;
pub use config::ConfigError;
pub use config::parse_bool_literal;
