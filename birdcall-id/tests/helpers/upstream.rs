//! Stub inference endpoint
//!
//! A real axum server on an ephemeral port, so the reqwest client is
//! exercised over an actual socket.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One multipart part as the stub saw it
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    hits: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Option<String>>>,
    parts: Arc<Mutex<Vec<ReceivedPart>>>,
}

/// Handle to a running stub
pub struct StubUpstream {
    pub url: String,
    state: StubState,
}

impl StubUpstream {
    /// Requests received so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the last request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().clone()
    }

    /// Parts of the last request
    pub fn last_parts(&self) -> Vec<ReceivedPart> {
        self.state.parts.lock().unwrap().clone()
    }
}

async fn predict(
    State(state): State<StubState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            len,
        });
    }
    *state.parts.lock().unwrap() = parts;

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
        .into_response()
}

/// Start a stub answering every POST with `status` and `body`
pub async fn spawn_upstream(status: StatusCode, body: impl Into<String>) -> StubUpstream {
    spawn_upstream_with_delay(status, body, None).await
}

/// Same as [`spawn_upstream`] but waits `delay` before answering
pub async fn spawn_upstream_with_delay(
    status: StatusCode,
    body: impl Into<String>,
    delay: Option<Duration>,
) -> StubUpstream {
    let state = StubState {
        status,
        body: body.into(),
        delay,
        hits: Arc::new(AtomicUsize::new(0)),
        authorization: Arc::new(Mutex::new(None)),
        parts: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::disable())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubUpstream {
        url: format!("http://{}/predict", addr),
        state,
    }
}

/// URL on a port nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/predict", addr)
}

/// Model answer naming `species` with the given confidence
pub fn prediction_body(species: &str, common_name: &str, confidence: f64) -> String {
    serde_json::json!({
        "species": species,
        "commonName": common_name,
        "scientificName": format!("{} scientificus", species),
        "confidence": confidence,
        "alternatives": [
            { "species": "Zorzal", "confidence": 0.05 },
            { "species": "Diuca", "confidence": 0.02 },
        ],
    })
    .to_string()
}
