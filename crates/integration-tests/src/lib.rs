//! Test harness for the EatHub client.
//!
//! [`MockBackend`] serves the REST API from an in-process `axum` server on an
//! ephemeral port. Every request is recorded, and a per-test responder
//! decides the reply from the request and how many times its route has been
//! hit, so tests can script "fail, then succeed" sequences. Routes can be
//! slowed down with [`MockBackend::slow`] to exercise client timeouts.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eathub-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use eathub_client::storage::{MemoryStorage, Storage};
use eathub_client::{ClientConfig, EatHub, RetrySettings};
use serde_json::Value;
use tokio::task::JoinHandle;

/// Path prefix the mock API is mounted under.
pub const API_PREFIX: &str = "/api";

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below [`API_PREFIX`], e.g. `/menu/42`.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub idempotency_key: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// `"GET /menu"`.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

type Responder = dyn Fn(&RecordedRequest, u32) -> (StatusCode, Value) + Send + Sync;

struct Shared {
    responder: Box<Responder>,
    requests: Mutex<Vec<RecordedRequest>>,
    hits: Mutex<HashMap<String, u32>>,
    /// Route -> (number of leading hits to delay, delay).
    delays: Mutex<HashMap<String, (u32, Duration)>>,
}

/// An in-process EatHub API.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend answering every request with `responder`.
    ///
    /// The responder gets the request and the 1-based hit count of its
    /// route (`"METHOD /path"`).
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(
        responder: impl Fn(&RecordedRequest, u32) -> (StatusCode, Value) + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(Shared {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            hits: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
        });
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    /// `http://127.0.0.1:<port>/api`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Times `route` (e.g. `"GET /menu"`) was requested.
    #[must_use]
    pub fn hits(&self, route: &str) -> u32 {
        self.shared
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    /// Hold the first `hits` requests to `route` for `delay` before replying.
    pub fn slow(&self, route: &str, hits: u32, delay: Duration) {
        self.shared
            .delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route.to_string(), (hits, delay));
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Client configuration pointing here, with millisecond retry delays.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url())
            .expect("Mock backend URL is valid")
            .with_retry(fast_retry())
            .with_timeout(Duration::from_secs(5))
    }

    /// A client over fresh in-memory storage.
    #[must_use]
    pub fn client(&self) -> EatHub {
        self.client_with_storage(Arc::new(MemoryStorage::new()))
    }

    /// A client over `storage`.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client_with_storage(&self, storage: Arc<dyn Storage>) -> EatHub {
        EatHub::new(self.config(), storage).expect("Failed to build client")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Retry delays short enough for tests.
#[must_use]
pub const fn fast_retry() -> RetrySettings {
    RetrySettings {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

/// Client configuration for a port nothing listens on.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn unreachable_config() -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    ClientConfig::new(&format!("http://{addr}{API_PREFIX}"))
        .expect("URL is valid")
        .with_retry(fast_retry())
}

/// `{ "error": { "message": ..., "code": ... } }`
#[must_use]
pub fn error_body(message: &str, code: &str) -> Value {
    serde_json::json!({ "error": { "message": message, "code": code } })
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path();
    let request = RecordedRequest {
        method,
        path: path.strip_prefix(API_PREFIX).unwrap_or(path).to_string(),
        query: uri.query().map(str::to_string),
        authorization: header("authorization"),
        idempotency_key: header("idempotency-key"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let hit = {
        let mut hits = shared.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let count = hits.entry(request.route()).or_insert(0);
        *count += 1;
        *count
    };
    let delay = shared
        .delays
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&request.route())
        .and_then(|&(slow_hits, delay)| (hit <= slow_hits).then_some(delay));
    shared
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request.clone());

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let (status, reply) = (shared.responder)(&request, hit);
    (status, axum::Json(reply)).into_response()
}
