// crates/fleet-bootstrap-cli/src/proxy.rs
// ============================================================================
// Module: Passthrough Proxy
// Description: Reverse proxy forwarding every request to one upstream.
// Purpose: Expose the downstream server on the bootstrap listen address.
// Dependencies: axum, reqwest, tokio, tracing, url
// ============================================================================

//! ## Overview
//! The proxy accepts any method on any path and replays the request against
//! the upstream base URL. Status, end-to-end headers, and body are returned
//! unmodified.
//! Invariants:
//! - Hop-by-hop headers, including those named by `Connection`, are never
//!   forwarded in either direction.
//! - Redirects are returned to the caller, not followed.
//! - An unreachable upstream yields `502 Bad Gateway`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use reqwest::Client;
use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;
use tracing::warn;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest request body the proxy buffers.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "proxy-authenticate",
    "proxy-authorization",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Proxy setup and serving errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream HTTP client could not be built.
    #[error("proxy client build failed: {0}")]
    Client(String),
    /// The listen socket could not be bound.
    #[error("proxy bind failed: {0}")]
    Bind(String),
    /// The server stopped with an I/O error.
    #[error("proxy server failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Shared handler state.
struct ProxyState {
    /// Upstream base URL.
    upstream: Url,
    /// Upstream HTTP client.
    client: Client,
}

/// Builds a router forwarding every request to `upstream`.
///
/// # Errors
///
/// Returns [`ProxyError::Client`] when the HTTP client cannot be built.
pub fn proxy_router(upstream: Url) -> Result<Router, ProxyError> {
    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .map_err(|err| ProxyError::Client(err.to_string()))?;
    let state = Arc::new(ProxyState {
        upstream,
        client,
    });
    Ok(Router::new().fallback(forward).with_state(state))
}

/// Serves the proxy on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ProxyError`] when the router cannot be built or serving fails.
pub async fn serve_proxy<F>(
    listener: TcpListener,
    upstream: Url,
    shutdown: F,
) -> Result<(), ProxyError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr().map_err(|err| ProxyError::Bind(err.to_string()))?;
    info!(listen = %local_addr, upstream = %upstream, "proxy listening");
    let app = proxy_router(upstream)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ProxyError::Serve(err.to_string()))
}

// ============================================================================
// SECTION: Forwarding
// ============================================================================

/// Replays `request` against the upstream.
async fn forward(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "proxy request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()).into_response();
        }
    };
    let target = upstream_url(&state.upstream, parts.uri.path(), parts.uri.query());
    let mut outbound_headers = end_to_end_headers(&parts.headers);
    outbound_headers.remove(header::HOST);
    outbound_headers.remove(header::CONTENT_LENGTH);

    let result = state
        .client
        .request(parts.method.clone(), target)
        .headers(outbound_headers)
        .body(body)
        .send()
        .await;
    let upstream_response = match result {
        Ok(response) => response,
        Err(err) => return bad_gateway(&parts.method, parts.uri.path(), &err),
    };
    let status = upstream_response.status();
    let mut headers = end_to_end_headers(upstream_response.headers());
    headers.remove(header::CONTENT_LENGTH);
    let bytes: Bytes = match upstream_response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => return bad_gateway(&parts.method, parts.uri.path(), &err),
    };
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Logs an upstream failure and returns `502 Bad Gateway`.
fn bad_gateway(method: &axum::http::Method, path: &str, err: &reqwest::Error) -> Response {
    warn!(%method, path, error = %err, "upstream request failed");
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

/// Joins the upstream base path with the request path and query.
#[must_use]
pub fn upstream_url(upstream: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = upstream.clone();
    let base = upstream.path().trim_end_matches('/');
    url.set_path(&format!("{base}{path}"));
    url.set_query(query);
    url
}

/// Copies `headers` without hop-by-hop entries.
#[must_use]
pub fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let listed: BTreeSet<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&name_str) || listed.contains(name_str) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}
