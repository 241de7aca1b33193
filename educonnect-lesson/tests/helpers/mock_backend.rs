//! In-process mock of the backend, timeline host and chat agent
//!
//! Binds to `127.0.0.1:0` and records every tracking and chat request.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
    pub authorization: Option<String>,
}

/// How the mock answers
#[derive(Debug, Clone, Default)]
pub struct MockBehaviour {
    /// Tracking writes answer 500
    pub fail_writes: bool,
    /// Tracking writes wait this long before answering
    pub write_delay: Duration,
    /// Current-lesson response; `None` answers 404
    pub current: Option<Value>,
    /// Timeline documents served under `/timelines/{name}`
    pub timelines: HashMap<String, String>,
    /// Chat agent response; `None` answers 500
    pub chat_reply: Option<Value>,
}

#[derive(Clone)]
struct MockState {
    behaviour: Arc<MockBehaviour>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    completed_writes: Arc<AtomicUsize>,
}

impl MockState {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            path,
            body,
            authorization,
        });
    }
}

pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(behaviour: MockBehaviour) -> Self {
        let state = MockState {
            behaviour: Arc::new(behaviour),
            requests: Arc::new(Mutex::new(Vec::new())),
            completed_writes: Arc::new(AtomicUsize::new(0)),
        };

        let app = Router::new()
            .route("/api/v1/tracking/lesson/:kind", post(tracking_write))
            .route("/api/v1/tracking/user/:user_id/current", get(current_lesson))
            .route("/timelines/:name", get(timeline))
            .route("/query", post(chat_query))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Backend base URL (tracking lives under it)
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Agent base URL
    pub fn agent_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn timeline_url(&self, name: &str) -> String {
        format!("http://{}/timelines/{}", self.addr, name)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Paths of recorded requests, in arrival order
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    /// Requests whose path ends with `suffix`
    pub fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }

    /// Tracking writes that ran to completion on the server
    pub fn completed_writes(&self) -> usize {
        self.state.completed_writes.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn tracking_write(
    State(state): State<MockState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(format!("/tracking/lesson/{}", kind), &headers, body);

    if !state.behaviour.write_delay.is_zero() {
        tokio::time::sleep(state.behaviour.write_delay).await;
    }
    state.completed_writes.fetch_add(1, Ordering::SeqCst);

    if state.behaviour.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, "tracking unavailable").into_response();
    }
    Json(json!({ "success": true, "kind": kind })).into_response()
}

async fn current_lesson(
    State(state): State<MockState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record(
        format!("/tracking/user/{}/current", user_id),
        &headers,
        Value::Null,
    );
    match &state.behaviour.current {
        Some(view) => Json(view.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no tracking data").into_response(),
    }
}

async fn timeline(State(state): State<MockState>, Path(name): Path<String>) -> Response {
    match state.behaviour.timelines.get(&name) {
        Some(text) => text.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn chat_query(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/query".to_string(), &headers, body);
    match &state.behaviour.chat_reply {
        Some(reply) => Json(reply.clone()).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "agent down").into_response(),
    }
}
