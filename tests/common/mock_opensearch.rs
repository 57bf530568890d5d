//! Mock OpenSearch cluster for exercising the HTTP handle.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use mongosearch_mcp::config::OpenSearchConfig;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::json("{}")
    }
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn error(status: u16, error_type: &str) -> Self {
        Self {
            status,
            body: format!(r#"{{"error": {{"type": "{}"}}, "status": {}}}"#, error_type, status)
                .into_bytes(),
        }
    }
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    root_status: Arc<AtomicU16>,
}

/// Mock cluster.
///
/// `/` (the ping target) answers with cluster info (status set by [`MockOpenSearch::set_root_status`]);
/// every other path pops the next queued response.
pub struct MockOpenSearch {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockOpenSearch {
    pub async fn start() -> Self {
        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            root_status: Arc::new(AtomicU16::new(200)),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/", any(handle_root))
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Handle configuration pointing at this server.
    pub fn config(&self) -> OpenSearchConfig {
        OpenSearchConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            timeout_seconds: 5,
            ..OpenSearchConfig::default()
        }
    }

    pub async fn enqueue_response(&self, resp: MockResponse) {
        self.state.responses.lock().await.push_back(resp);
    }

    pub fn set_root_status(&self, status: u16) {
        self.state.root_status.store(status, Ordering::SeqCst);
    }

    /// All captured requests, pings included.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Captured requests other than pings.
    pub async fn api_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests()
            .await
            .into_iter()
            .filter(|request| request.path != "/")
            .collect()
    }
}

impl Drop for MockOpenSearch {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn capture(state: &MockState, req: Request<Body>) {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let body = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    state.requests.lock().await.push(CapturedRequest {
        method,
        path,
        query,
        headers,
        body,
    });
}

fn respond(status: u16, body: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn handle_root(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    capture(&state, req).await;
    let status = state.root_status.load(Ordering::SeqCst);
    if status == 200 {
        respond(
            200,
            br#"{"cluster_name": "mock", "version": {"distribution": "opensearch", "number": "2.11.0"}}"#
                .to_vec(),
        )
    } else {
        let resp = MockResponse::error(status, "security_exception");
        respond(resp.status, resp.body)
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    capture(&state, req).await;
    let resp = state
        .responses
        .lock()
        .await
        .pop_front()
        .unwrap_or_default();
    respond(resp.status, resp.body)
}
