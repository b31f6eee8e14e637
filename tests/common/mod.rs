#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use carelink_lib::services::chat_gateway::ChatGateway;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const SLOW_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default)]
pub struct RecordedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub fields: Vec<RecordedField>,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&RecordedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|f| String::from_utf8_lossy(&f.data).into_owned())
    }
}

#[derive(Clone, Default)]
pub struct MockState {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub logins: Arc<Mutex<Vec<Value>>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

async fn record(state: &MockState, mut multipart: Multipart) -> RecordedRequest {
    let mut request = RecordedRequest::default();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.expect("field bytes").to_vec();
        request.fields.push(RecordedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(request.clone());
    request
}

/// Replies "Echo: <message>" in the canonical field.
async fn echo(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    let request = record(&state, multipart).await;
    let message = request.text("message").unwrap_or_default();
    Json(json!({ "reply": format!("Echo: {message}") }))
}

async fn cholesterol(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    record(&state, multipart).await;
    Json(json!({ "reply": "Your cholesterol is normal." }))
}

async fn fixed_x(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    record(&state, multipart).await;
    Json(json!({ "reply": "X" }))
}

async fn legacy(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    record(&state, multipart).await;
    Json(json!({ "response": "from the legacy field" }))
}

async fn empty(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    record(&state, multipart).await;
    Json(json!({}))
}

async fn fail(State(state): State<MockState>, multipart: Multipart) -> StatusCode {
    record(&state, multipart).await;
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn garbage(State(state): State<MockState>, multipart: Multipart) -> (StatusCode, &'static str) {
    record(&state, multipart).await;
    (StatusCode::OK, "<html>not json</html>")
}

async fn slow(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    record(&state, multipart).await;
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({ "reply": "slow answer" }))
}

async fn login_ok(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.logins.lock().expect("logins lock").push(body);
    Json(json!({ "token": "abc" }))
}

async fn login_denied(State(state): State<MockState>, Json(body): Json<Value>) -> StatusCode {
    state.logins.lock().expect("logins lock").push(body);
    StatusCode::UNAUTHORIZED
}

pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/echo", post(echo))
            .route("/cholesterol", post(cholesterol))
            .route("/x", post(fixed_x))
            .route("/legacy", post(legacy))
            .route("/empty", post(empty))
            .route("/fail", post(fail))
            .route("/garbage", post(garbage))
            .route("/slow", post(slow))
            .route("/api/login", post(login_ok))
            .route("/api/login-denied", post(login_denied))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server listener");
        let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("run mock server");
        });

        Self {
            base_url: format!("http://{address}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn gateway(&self, path: &str) -> ChatGateway {
        ChatGateway::new(&self.url(path), Some(Duration::from_secs(5))).expect("gateway")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// An address nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{address}/api/ai-chat")
}
