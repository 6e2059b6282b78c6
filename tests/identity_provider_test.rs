//! Integration tests for the client-credentials token provider

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use caas_controller::domain::errors::CredentialError;
use caas_controller::domain::ports::CredentialProvider;
use caas_controller::infrastructure::credentials::IdentityTokenProvider;

fn provider_for(server: &Server) -> IdentityTokenProvider {
    IdentityTokenProvider::new(
        format!("{}/oauth/token", server.url()),
        "client-id".to_string(),
        "client-secret".to_string(),
        Duration::from_secs(5),
    )
    .expect("Failed to create provider")
    .with_retry_window(Duration::from_secs(5))
}

#[tokio::test]
async fn test_token_is_fetched_once_and_cached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
        ]))
        .with_status(200)
        .with_body(json!({"access_token": "abc", "expires_in": 3600}).to_string())
        .expect(1)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let first = provider.token().await.unwrap();
    let second = provider.token().await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.secret(), "abc");
    assert_eq!(second.secret(), "abc");
}

#[tokio::test]
async fn test_token_inside_expiry_skew_is_refreshed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(json!({"access_token": "short", "expires_in": 10}).to_string())
        .expect(2)
        .create_async()
        .await;

    // 10s lifetime is already inside the 30s skew, so every call refreshes
    let provider = provider_for(&server);
    provider.token().await.unwrap();
    provider.token().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/oauth/token")
        .with_status(500)
        .with_body("try again")
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(json!({"access_token": "after-retry"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let token = provider_for(&server).token().await.unwrap();

    failing.assert_async().await;
    succeeding.assert_async().await;
    assert_eq!(token.secret(), "after-retry");
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/token")
        .with_status(401)
        .with_body("bad client")
        .expect(1)
        .create_async()
        .await;

    let err = provider_for(&server).token().await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, CredentialError::Request(ref e) if e.status() == Some(401)));
}

#[tokio::test]
async fn test_empty_access_token_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(json!({"access_token": ""}).to_string())
        .create_async()
        .await;

    let err = provider_for(&server).token().await.unwrap_err();
    assert!(matches!(err, CredentialError::InvalidResponse(_)));
}
