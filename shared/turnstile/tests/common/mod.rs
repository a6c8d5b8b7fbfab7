#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SITEVERIFY_PATH: &str = "/turnstile/v0/siteverify";

pub const SUCCESS_BODY: &str = r#"{ "success": true,  "error-codes": [],  "challenge_ts": "2023-06-25T23:56:14.476Z",  "hostname": "example.com" }"#;

pub const FAILURE_BODY: &str =
    r#"{ "success": false, "error-codes": [ "invalid-input-response" ], "messages": [] }"#;

/// Initialize tracing for tests
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Requests received by a mock server, in arrival order
#[derive(Clone, Default)]
pub struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorded {
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

/// Serves `router` on an ephemeral local port and returns the siteverify URL
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}{SITEVERIFY_PATH}")
}

fn json_response(status: StatusCode, body: String) -> impl IntoResponse {
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// Mock that behaves like siteverify for the tokens used in the tests: an
/// empty token is rejected, anything else passes. Every body is recorded.
pub async fn spawn_siteverify() -> (String, Recorded) {
    async fn handler(State(recorded): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
        let token = body["response"].as_str().unwrap_or_default().to_string();
        recorded.bodies.lock().unwrap().push(body);

        if token.is_empty() {
            json_response(StatusCode::OK, FAILURE_BODY.to_string())
        } else {
            json_response(StatusCode::OK, SUCCESS_BODY.to_string())
        }
    }

    let recorded = Recorded::default();
    let router = Router::new()
        .route(SITEVERIFY_PATH, post(handler))
        .with_state(recorded.clone());

    (spawn_server(router).await, recorded)
}

/// Mock that reflects the request back into the verdict: `hostname` is the
/// token, `action` the remote IP, `cdata` the idempotency key.
pub async fn spawn_echo() -> String {
    async fn handler(Json(body): Json<Value>) -> impl IntoResponse {
        let verdict = json!({
            "success": true,
            "error-codes": [],
            "challenge_ts": "2023-06-25T23:56:14.476Z",
            "hostname": body["response"],
            "action": body.get("remoteip").cloned().unwrap_or(Value::Null),
            "cdata": body.get("idempotency_key").cloned().unwrap_or(Value::Null),
        });
        json_response(StatusCode::OK, verdict.to_string())
    }

    spawn_server(Router::new().route(SITEVERIFY_PATH, post(handler))).await
}

/// Mock that reports the `User-Agent` it received as the `action`
pub async fn spawn_user_agent_echo() -> String {
    async fn handler(headers: HeaderMap) -> impl IntoResponse {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let verdict = json!({ "success": true, "error-codes": [], "action": user_agent });
        json_response(StatusCode::OK, verdict.to_string())
    }

    spawn_server(Router::new().route(SITEVERIFY_PATH, post(handler))).await
}

/// Mock that answers every request with `body`
pub async fn spawn_fixed(body: &'static str) -> String {
    let router = Router::new().route(
        SITEVERIFY_PATH,
        post(move || async move { json_response(StatusCode::OK, body.to_string()) }),
    );

    spawn_server(router).await
}

/// Mock that answers with a non-JSON error page
pub async fn spawn_garbage() -> String {
    async fn handler() -> impl IntoResponse {
        (StatusCode::BAD_GATEWAY, "<html>upstream unavailable</html>")
    }

    spawn_server(Router::new().route(SITEVERIFY_PATH, post(handler))).await
}

/// Mock that answers only after `delay`
pub async fn spawn_slow(delay: Duration) -> String {
    let router = Router::new().route(
        SITEVERIFY_PATH,
        post(move || async move {
            tokio::time::sleep(delay).await;
            json_response(StatusCode::OK, SUCCESS_BODY.to_string())
        }),
    );

    spawn_server(router).await
}

/// URL of a local port with nothing listening on it
pub fn unreachable_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{addr}{SITEVERIFY_PATH}")
}
