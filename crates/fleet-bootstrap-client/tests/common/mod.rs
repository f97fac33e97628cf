// crates/fleet-bootstrap-client/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Scripted Fleet HTTP server on an ephemeral port.
// Purpose: Record client requests and answer them from a routing closure.
// Dependencies: tiny_http, url
// ============================================================================

//! ## Overview
//! [`FakeFleet`] serves requests on `127.0.0.1:0` from a background thread
//! and records every request it receives.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Recorded Requests
// ============================================================================

/// Request observed by [`FakeFleet`].
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Request method.
    pub method: String,
    /// Path and query as sent on the request line.
    pub url: String,
    /// Header fields in arrival order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

impl Recorded {
    /// Returns the decoded request path.
    pub fn path(&self) -> String {
        self.parsed().path().to_string()
    }

    /// Returns the decoded query pairs.
    pub fn query(&self) -> Vec<(String, String)> {
        self.parsed()
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Returns the first header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// Parses the request target against a placeholder origin.
    fn parsed(&self) -> Url {
        Url::parse(&format!("http://fleet.test{}", self.url)).unwrap()
    }
}

// ============================================================================
// SECTION: Fake Fleet Server
// ============================================================================

/// Scripted HTTP server.
pub struct FakeFleet {
    /// Bound `host:port`.
    pub addr: String,
    /// Underlying server, unblocked on drop.
    server: Arc<Server>,
    /// Requests received so far.
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeFleet {
    /// Starts a server answering each request with `route(request)`.
    pub fn serve<F>(route: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap().to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let worker_server = Arc::clone(&server);
        let worker_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for mut request in worker_server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let recorded = Recorded {
                    method: request.method().as_str().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| {
                            (
                                header.field.as_str().as_str().to_string(),
                                header.value.as_str().to_string(),
                            )
                        })
                        .collect(),
                    body,
                };
                let (status, payload) = route(&recorded);
                worker_requests.lock().unwrap().push(recorded);
                let content_type =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response =
                    Response::from_string(payload).with_status_code(status).with_header(content_type);
                let _ = request.respond(response);
            }
        });
        Self {
            addr,
            server,
            requests,
        }
    }

    /// Fleet API root with embedded credentials.
    pub fn fleet_url(&self) -> Url {
        Url::parse(&format!("http://admin:changeme@{}/api/fleet", self.addr)).unwrap()
    }

    /// Server root without credentials.
    pub fn root_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeFleet {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Returns a URL on a port nothing listens on.
pub fn unreachable_fleet_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/api/fleet")).unwrap()
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Full APM package document as served by Fleet or the registry.
pub fn apm_package_json(version: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "apm",
        "version": version,
        "title": "Elastic APM",
        "release": "ga",
        "policy_templates": [{
            "name": "apmserver",
            "title": "Elastic APM Integration",
            "inputs": [{
                "type": "apm",
                "title": "Collect application traces",
                "vars": [
                    {"name": "host", "type": "text", "default": "localhost:8200"},
                    {"name": "enable_rum", "type": "bool", "default": false},
                    {"name": "secret_token", "type": "text"},
                    {"name": "max_event_size", "type": "integer"}
                ]
            }]
        }]
    })
}
