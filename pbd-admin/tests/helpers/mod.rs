//! Shared test helpers for pbd-admin integration tests
//!
//! - `MockService`: in-process stand-in for the ticketing service REST API
//! - work list / environment builders

#![allow(dead_code)]

pub mod log_capture;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// One request as seen by the mock service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    stalled: Arc<Mutex<HashSet<(String, String)>>>,
}

/// Ticketing service mock bound to an ephemeral local port
///
/// Defaults: identity check 200, project reads 200, PUT 200, DELETE 204.
pub struct MockService {
    pub base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle_request).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Script the response for `method path`
    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
    }

    /// Never answer `method path`; the client has to give up on its own
    pub fn stall(&self, method: &str, path: &str) {
        self.state
            .stalled
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Non-GET requests, in arrival order
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != "GET")
            .collect()
    }

    /// `METHOD /path` lines for every request, in arrival order
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    /// Environment lookup pointing at this mock
    pub fn env(&self, extra: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut vars: Vec<(&str, &str)> = vec![
            ("email", "admin@example.com"),
            ("api_token", "test-token"),
            ("base_url", self.base_url.as_str()),
        ];
        vars.extend_from_slice(extra);
        env_from(&vars)
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_request(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: serde_json::from_str(&body).ok(),
        content_type: header("content-type"),
        authorization: header("authorization"),
    });

    let route = (method.to_string(), path.clone());
    let stalled = state.stalled.lock().unwrap().contains(&route);
    if stalled {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    let scripted = state.responses.lock().unwrap().get(&route).cloned();

    let (status, body) = scripted.unwrap_or_else(|| default_response(&method, &path));
    (StatusCode::from_u16(status).unwrap(), body)
}

fn default_response(method: &Method, path: &str) -> (u16, String) {
    if method == Method::GET && path.ends_with("/myself") {
        (200, r#"{"accountId":"admin-1","displayName":"Batch Admin"}"#.to_string())
    } else if method == Method::GET {
        (200, r#"{"key":"ANY"}"#.to_string())
    } else if method == Method::DELETE {
        (204, String::new())
    } else {
        (200, "{}".to_string())
    }
}

/// Environment lookup from literal pairs
pub fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

/// Write `content` as `projects.csv` inside `dir`
pub fn write_work_list(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("projects.csv");
    std::fs::write(&path, content).unwrap();
    path
}
