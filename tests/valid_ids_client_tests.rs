mod common;

use agora_checkin::models::AccessToken;
use agora_checkin::services::ValidIdsSource;
use agora_checkin::utils::{CheckInError, ErrorKind};
use common::{client, dead_backend, spawn_backend};

fn token(raw: &str) -> AccessToken {
    AccessToken::parse(Some(raw)).unwrap()
}

async fn fetch_err(base_url: &str, event_id: &str, raw_token: &str) -> CheckInError {
    client(base_url)
        .fetch_valid_ids(event_id, &token(raw_token))
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_fetches_allow_list() {
    let backend = spawn_backend().await;
    let payload = client(&backend)
        .fetch_valid_ids("E1", &token("tok"))
        .await
        .unwrap();

    let (name, ids) = payload.ticket_ids();
    assert_eq!(name, "Launch Night");
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["T1", "T2"]);
}

#[tokio::test]
async fn test_numeric_ids_are_stringified() {
    let backend = spawn_backend().await;
    let payload = client(&format!("{}/", backend))
        .fetch_valid_ids("E7", &token("tok"))
        .await
        .unwrap();

    let (_, ids) = payload.ticket_ids();
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["1001", "1002", "1003"]);
}

#[tokio::test]
async fn test_rejected_tokens_are_auth_failures() {
    let backend = spawn_backend().await;

    let expired = fetch_err(&backend, "E1", "expired").await;
    assert!(matches!(expired, CheckInError::Unauthorized { status: 401 }));

    let revoked = fetch_err(&backend, "E1", "revoked").await;
    assert!(matches!(revoked, CheckInError::Unauthorized { status: 403 }));
    assert!(revoked.is_rejection());
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let backend = spawn_backend().await;
    let err = fetch_err(&backend, "E404", "tok").await;
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.user_message().contains("E404"));
}

#[tokio::test]
async fn test_server_and_payload_failures_are_retryable() {
    let backend = spawn_backend().await;

    let server = fetch_err(&backend, "E500", "tok").await;
    assert_eq!(server.kind(), ErrorKind::Network);

    let malformed = fetch_err(&backend, "EBAD", "tok").await;
    assert_eq!(malformed.kind(), ErrorKind::Network);
    assert!(malformed.is_retryable());
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let backend = dead_backend().await;
    let err = fetch_err(&backend, "E1", "tok").await;
    assert!(matches!(err, CheckInError::Network(_)));
}

#[tokio::test]
async fn test_network_errors_do_not_carry_the_access_token() {
    let unreachable = fetch_err(&dead_backend().await, "E1", "SECRET-TOKEN-123").await;
    assert!(matches!(unreachable, CheckInError::Network(_)));
    assert!(!unreachable.to_string().contains("SECRET-TOKEN-123"));

    let backend = spawn_backend().await;
    let malformed = fetch_err(&backend, "EBAD", "SECRET-TOKEN-123").await;
    assert!(!malformed.to_string().contains("SECRET-TOKEN-123"));
}
