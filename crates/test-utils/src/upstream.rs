//! A canned-response HTTP server on `127.0.0.1:0`.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;

/// A request the stand-in received.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct Upstream {
    status: StatusCode,
    body: String,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn respond(
    State(upstream): State<Upstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.captured.lock().expect("capture lock").push(Captured {
        method,
        path: uri.path().to_string(),
        authorization,
        body,
    });
    (upstream.status, upstream.body.clone())
}

/// Serves `status`/`body` for every request and returns the base URL plus
/// the capture log.
pub async fn spawn(
    status: StatusCode,
    body: impl Into<String>,
) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(respond).with_state(Upstream {
        status,
        body: body.into(),
        captured: Arc::clone(&captured),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), captured)
}
