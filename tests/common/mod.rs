//! Shared fixtures: a stand-in ticketing backend and request helpers.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use agora_checkin::config::Config;
use agora_checkin::services::{HttpValidIdsClient, LocalStorage};
use agora_checkin::state::AppState;

pub const DISPLAY_WINDOW: Duration = Duration::from_millis(150);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// E1 has tickets T1 and T2, E7 uses numeric ids, E500 is broken, anything else is unknown.
async fn valid_ids(Path(event_id): Path<String>, Query(query): Query<TokenQuery>) -> Response {
    match (event_id.as_str(), query.token.as_deref()) {
        (_, None) | (_, Some("expired")) => StatusCode::UNAUTHORIZED.into_response(),
        (_, Some("revoked")) => StatusCode::FORBIDDEN.into_response(),
        ("E1", Some(_)) => Json(json!({
            "event_name": "Launch Night",
            "valid_ticket_ids": ["T1", "T2"],
        }))
        .into_response(),
        ("E7", Some(_)) => Json(json!({
            "event_name": "Matinee",
            "valid_ticket_ids": [1001, 1002, "1003"],
        }))
        .into_response(),
        ("E500", Some(_)) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        ("EBAD", Some(_)) => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves the mock backend on a loopback port and returns its base URL.
pub async fn spawn_backend() -> String {
    let app = Router::new().route("/api/tickets/event/:event_id/valid-ids/", get(valid_ids));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on.
pub async fn dead_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn client(base_url: &str) -> HttpValidIdsClient {
    HttpValidIdsClient::new(base_url, Duration::from_secs(5)).unwrap()
}

pub fn state(base_url: &str, storage: LocalStorage) -> Arc<AppState> {
    let config = Config {
        api_base_url: base_url.to_string(),
        display_window: DISPLAY_WINDOW,
        ..Config::default()
    };
    AppState::new(config, storage, client(base_url))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
