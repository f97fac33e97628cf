// crates/fleet-bootstrap-client/src/client.rs
// ============================================================================
// Module: Fleet HTTP Client
// Description: Blocking reqwest implementation of the control-plane seam.
// Purpose: Translate control-plane calls into Fleet REST requests.
// Dependencies: fleet-bootstrap-core, reqwest, serde_json, tracing, url
// ============================================================================

//! ## Overview
//! [`FleetClient`] owns a blocking HTTP client and the Fleet API root. All
//! requests share one send path that applies the Kibana headers, basic auth,
//! and status classification.
//! Invariants:
//! - Transport failures map to `ControlPlaneError::Transport`.
//! - Non-2xx statuses map to `ControlPlaneError::RequestFailed` with the body.
//! - Undecodable 2xx bodies map to `ControlPlaneError::Decode`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use fleet_bootstrap_core::AgentPolicy;
use fleet_bootstrap_core::ControlPlane;
use fleet_bootstrap_core::ControlPlaneError;
use fleet_bootstrap_core::Package;
use fleet_bootstrap_core::PackagePolicy;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::wire::DeleteRequest;
use crate::wire::ItemResponse;
use crate::wire::ListResponse;
use crate::wire::failed_deletions;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Source of package definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageCatalog {
    /// Fleet's own package endpoints under `{fleet}/epm/packages`.
    #[default]
    Fleet,
    /// Standalone package registry at the given base URL.
    Registry(Url),
}

/// Fleet client configuration.
///
/// # Invariants
/// - `fleet_url` is the Fleet API root (`{kibana}/api/fleet`) and may embed
///   basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct FleetClientConfig {
    /// Fleet API root.
    pub fleet_url: Url,
    /// Package catalog to search.
    pub catalog: PackageCatalog,
    /// Timeout applied to each request.
    pub timeout: Duration,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl FleetClientConfig {
    /// Creates a configuration with the Fleet catalog and default limits.
    #[must_use]
    pub fn new(fleet_url: Url) -> Self {
        Self {
            fleet_url,
            catalog: PackageCatalog::Fleet,
            timeout: Duration::from_secs(30),
            user_agent: concat!("fleet-bootstrap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Replaces the package catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: PackageCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

impl std::fmt::Debug for FleetClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClientConfig")
            .field("fleet_url", &without_credentials(&self.fleet_url).as_str())
            .field("credentials", &has_credentials(&self.fleet_url).then_some("<redacted>"))
            .field("catalog", &self.catalog)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Client construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Fleet URL cannot be used as a request base.
    #[error("invalid fleet url: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Basic-auth credentials split off the configured URL.
#[derive(Clone)]
struct Credentials {
    /// User name.
    username: String,
    /// Optional password.
    password: Option<String>,
}

/// Blocking Fleet control-plane client.
pub struct FleetClient {
    /// Fleet API root without credentials.
    fleet_url: Url,
    /// Credentials applied to Fleet requests.
    credentials: Option<Credentials>,
    /// Package catalog.
    catalog: PackageCatalog,
    /// Underlying HTTP client.
    client: Client,
}

impl std::fmt::Debug for FleetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClient")
            .field("fleet_url", &self.fleet_url.as_str())
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl FleetClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the URL cannot carry path segments or the
    /// HTTP client cannot be built.
    pub fn new(config: FleetClientConfig) -> Result<Self, ClientError> {
        if config.fleet_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(
                without_credentials(&config.fleet_url).to_string(),
            ));
        }
        let credentials = has_credentials(&config.fleet_url).then(|| Credentials {
            username: config.fleet_url.username().to_string(),
            password: config.fleet_url.password().map(str::to_string),
        });
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            fleet_url: without_credentials(&config.fleet_url),
            credentials,
            catalog: config.catalog,
            client,
        })
    }

    /// Returns the Fleet API root without credentials.
    #[must_use]
    pub const fn fleet_url(&self) -> &Url {
        &self.fleet_url
    }

    /// Builds a Fleet endpoint URL from path segments and query pairs.
    fn fleet_endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        endpoint(&self.fleet_url, segments, query)
    }

    /// Starts a Fleet request with credentials applied.
    fn fleet_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_deref())
            }
            None => request,
        }
    }

    /// Sends a request and returns the status and body of a 2xx response.
    fn send(request: RequestBuilder) -> Result<(u16, String), ControlPlaneError> {
        let request = request.header("kbn-xsrf", "1").header(CONTENT_TYPE, "application/json");
        let response = request.send().map_err(transport_error)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "control plane responded");
        let body = response.text().map_err(transport_error)?;
        if !status.is_success() {
            return Err(ControlPlaneError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok((status.as_u16(), body))
    }

    /// Sends a request and decodes the JSON body.
    fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ControlPlaneError> {
        let (_, body) = Self::send(request)?;
        serde_json::from_str(&body).map_err(|err| ControlPlaneError::Decode(err.to_string()))
    }

    /// Encodes `payload` as the request body.
    fn with_json_body<T: Serialize + ?Sized>(
        request: RequestBuilder,
        payload: &T,
    ) -> Result<RequestBuilder, ControlPlaneError> {
        let body =
            serde_json::to_vec(payload).map_err(|err| ControlPlaneError::Decode(err.to_string()))?;
        Ok(request.body(body))
    }

    /// Searches Fleet's own package catalog.
    fn search_fleet_catalog(&self, name: &str) -> Result<Vec<Package>, ControlPlaneError> {
        let url = self.fleet_endpoint(&["epm", "packages"], &[("experimental", "true")]);
        let listed: ListResponse<Package> = Self::send_json(self.fleet_request(Method::GET, url))?;
        let summary = listed.into_items().into_iter().find(|package| package.name == name);
        let Some(summary) = summary else {
            return Ok(Vec::new());
        };
        let detail_segment = format!("{}-{}", summary.name, summary.version);
        let url = self.fleet_endpoint(&["epm", "packages", &detail_segment], &[]);
        let detail: ItemResponse<Package> = Self::send_json(self.fleet_request(Method::GET, url))?;
        Ok(vec![detail.into_item()?])
    }

    /// Searches a standalone package registry.
    fn search_registry(
        &self,
        registry: &Url,
        name: &str,
    ) -> Result<Vec<Package>, ControlPlaneError> {
        let url =
            endpoint(registry, &["search"], &[("package", name), ("experimental", "true")]);
        let listed: Vec<Package> = Self::send_json(self.client.get(url))?;
        let Some(summary) = listed.into_iter().find(|package| package.name == name) else {
            return Ok(Vec::new());
        };
        let url = endpoint(registry, &["package", &summary.name, &summary.version], &[]);
        let detail: Package = Self::send_json(self.client.get(url))?;
        Ok(vec![detail])
    }
}

impl ControlPlane for FleetClient {
    fn agent_policies(&self, kuery: &str) -> Result<Vec<AgentPolicy>, ControlPlaneError> {
        let url = self.fleet_endpoint(&["agent_policies"], &[("kuery", kuery)]);
        let listed: ListResponse<AgentPolicy> =
            Self::send_json(self.fleet_request(Method::GET, url))?;
        Ok(listed.into_items())
    }

    fn search_packages(&self, name: &str) -> Result<Vec<Package>, ControlPlaneError> {
        match &self.catalog {
            PackageCatalog::Fleet => self.search_fleet_catalog(name),
            PackageCatalog::Registry(registry) => self.search_registry(registry, name),
        }
    }

    fn package_policies(&self, kuery: &str) -> Result<Vec<PackagePolicy>, ControlPlaneError> {
        let url = self.fleet_endpoint(&["package_policies"], &[("kuery", kuery)]);
        let listed: ListResponse<PackagePolicy> =
            Self::send_json(self.fleet_request(Method::GET, url))?;
        Ok(listed.into_items())
    }

    fn create_package_policy(
        &self,
        policy: &PackagePolicy,
    ) -> Result<PackagePolicy, ControlPlaneError> {
        let url = self.fleet_endpoint(&["package_policies"], &[]);
        let request = Self::with_json_body(self.fleet_request(Method::POST, url), policy)?;
        let created: ItemResponse<PackagePolicy> = Self::send_json(request)?;
        created.into_item()
    }

    fn delete_package_policies(&self, ids: &[String]) -> Result<(), ControlPlaneError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.fleet_endpoint(&["package_policies", "delete"], &[]);
        let payload = DeleteRequest {
            package_policy_ids: ids,
        };
        let request = Self::with_json_body(self.fleet_request(Method::POST, url), &payload)?;
        let (status, body) = Self::send(request)?;
        let response: Value =
            serde_json::from_str(&body).map_err(|err| ControlPlaneError::Decode(err.to_string()))?;
        let failed = failed_deletions(&response);
        if !failed.is_empty() {
            debug!(ids = %failed.join(","), "control plane rejected package policy deletion");
            return Err(ControlPlaneError::RequestFailed {
                status,
                body,
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Appends path segments and query pairs to `base`.
fn endpoint(base: &Url, segments: &[&str], query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    url
}

/// Returns true when `url` embeds a user name or password.
fn has_credentials(url: &Url) -> bool {
    !url.username().is_empty() || url.password().is_some()
}

/// Returns `url` with any embedded credentials removed.
fn without_credentials(url: &Url) -> Url {
    let mut stripped = url.clone();
    // Both setters only fail for URLs that cannot carry credentials at all.
    if stripped.set_password(None).is_err() || stripped.set_username("").is_err() {
        return url.clone();
    }
    stripped
}

/// Maps a reqwest failure to a transport error, keeping its cause chain.
fn transport_error(err: reqwest::Error) -> ControlPlaneError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ControlPlaneError::Transport(message)
}
