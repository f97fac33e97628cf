// crates/fleet-bootstrap-cli/src/main.rs
// ============================================================================
// Module: Fleet Bootstrap Binary
// Description: Entry point running the bootstrap and then the proxy.
// Purpose: Converge Fleet once, then forward traffic to the downstream server.
// Dependencies: fleet-bootstrap-client, fleet-bootstrap-config, fleet-bootstrap-core, tokio
// ============================================================================

//! ## Overview
//! `fleet-bootstrap` takes no arguments. It reads its configuration from the
//! environment, runs the bootstrap synchronously, and only after a successful
//! run starts the passthrough proxy. Any failure ends the process with a
//! non-zero exit status and the proxy never starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;

use fleet_bootstrap_cli::ProxyError;
use fleet_bootstrap_cli::init_tracing;
use fleet_bootstrap_cli::serve_proxy;
use fleet_bootstrap_client::ClientError;
use fleet_bootstrap_client::FleetClient;
use fleet_bootstrap_client::FleetClientConfig;
use fleet_bootstrap_client::PackageCatalog;
use fleet_bootstrap_config::BootstrapConfig;
use fleet_bootstrap_config::ConfigError;
use fleet_bootstrap_core::BootstrapError;
use fleet_bootstrap_core::ReconcileOutcome;
use fleet_bootstrap_core::ThreadSleeper;
use fleet_bootstrap_core::bootstrap;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal CLI failure.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The Fleet client could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The bootstrap failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// The async runtime could not be started.
    #[error("runtime start failed: {0}")]
    Runtime(String),
    /// The proxy failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point.
fn main() -> ExitCode {
    if let Err(err) = init_tracing() {
        return emit_error(&err.to_string());
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fleet bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

/// Runs the bootstrap, then serves the proxy until interrupted.
fn run() -> Result<(), CliError> {
    let config = BootstrapConfig::from_env()?;
    let catalog =
        config.package_registry.clone().map_or(PackageCatalog::Fleet, PackageCatalog::Registry);
    let client_config = FleetClientConfig::new(config.fleet_url.clone()).with_catalog(catalog);
    let client = FleetClient::new(client_config)?;
    info!(
        fleet_url = %client.fleet_url(),
        fleet_server = config.fleet_server,
        "starting fleet bootstrap"
    );

    // Blocking HTTP must finish before the async runtime exists.
    let report = bootstrap(&client, &ThreadSleeper, &config.plan())?;
    match &report.outcome {
        ReconcileOutcome::Unchanged {
            ..
        } => info!(
            policy_id = %report.policy.id,
            version = %report.package.version,
            "integration already configured"
        ),
        ReconcileOutcome::Replaced {
            reason,
            deleted,
            ..
        } => info!(
            policy_id = %report.policy.id,
            version = %report.package.version,
            reason = %reason,
            deleted = deleted.len(),
            "integration configured"
        ),
    }

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::Runtime(err.to_string()))?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|err| ProxyError::Bind(format!("{}: {err}", config.listen_addr)))?;
        serve_proxy(listener, config.upstream_url, shutdown_signal()).await
    })?;
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
