//! Integration tests for the control-plane HTTP client
//!
//! A mockito server stands in for the control plane. Coverage:
//! - bearer auth and query parameters on list/get calls
//! - `{"items": [...]}` envelope decoding
//! - error message extraction from JSON and plain-text bodies
//! - request bodies for mutations

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use caas_controller::domain::errors::ClientError;
use caas_controller::domain::models::{CreateCluster, MachineSet, ObservedState};
use caas_controller::domain::ports::{AccessToken, ControlPlaneClient};
use caas_controller::infrastructure::caas::{CaasClient, CaasClientConfig};
use caas_controller::services::RetryClassifier;

fn client_for(server: &Server) -> CaasClient {
    CaasClient::new(CaasClientConfig {
        base_url: format!("{}/mcaas/", server.url()),
        timeout: Duration::from_secs(5),
        user_agent: "caasctl-test".to_string(),
    })
    .expect("Failed to create client")
}

fn token() -> AccessToken {
    AccessToken::new("test-token")
}

#[tokio::test]
async fn test_list_clusters_sends_auth_and_space() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/mcaas/v1/clusters")
        .match_header("authorization", "Bearer test-token")
        .match_header("user-agent", "caasctl-test")
        .match_query(Matcher::UrlEncoded("spaceID".into(), "space-1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    {"id": "c-1", "name": "a", "state": "ready"},
                    {"id": "c-2", "name": "b", "state": "infra-provisioning"},
                    {"id": "c-3", "name": "c", "state": "error"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let clusters = client_for(&server).list_clusters(&token(), "space-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(clusters.len(), 3);
    assert_eq!(clusters[0].state, ObservedState::Ready);
    assert_eq!(clusters[1].state, ObservedState::Provisioning);
    assert_eq!(clusters[2].state, ObservedState::Unrecognized("error".to_string()));
}

#[tokio::test]
async fn test_empty_collection_decodes() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcaas/v1/appliances")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let sites = client_for(&server).list_sites(&token(), "space-1").await.unwrap();
    assert!(sites.is_empty());
}

#[tokio::test]
async fn test_error_message_taken_from_json_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcaas/v1/clusters/c-404")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message": "cluster c-404 not found"}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .get_cluster(&token(), "c-404", "space-1")
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "cluster c-404 not found");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body_kept_verbatim() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcaas/v1/clusters")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let err = client_for(&server).list_clusters(&token(), "space-1").await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("upstream unavailable"));
    assert!(RetryClassifier::default().is_transient(&err));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcaas/v1/clusters/c-1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = client_for(&server)
        .get_cluster(&token(), "c-1", "space-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(!RetryClassifier::default().is_transient(&err));
}

#[tokio::test]
async fn test_create_cluster_posts_wire_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/mcaas/v1/clusters")
        .match_body(Matcher::PartialJson(json!({
            "name": "demo",
            "clusterBlueprintId": "cbp-1",
            "applianceID": "site-1",
            "spaceID": "space-1"
        })))
        .with_status(201)
        .with_body(json!({"id": "c-7", "name": "demo", "state": "initializing"}).to_string())
        .create_async()
        .await;

    let request = CreateCluster {
        name: "demo".to_string(),
        cluster_blueprint_id: "cbp-1".to_string(),
        appliance_id: "site-1".to_string(),
        space_id: "space-1".to_string(),
        machine_sets: vec![],
    };
    let accepted = client_for(&server).create_cluster(&token(), &request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(accepted.id, "c-7");
    assert_eq!(accepted.state, ObservedState::Initializing);
}

#[tokio::test]
async fn test_update_machine_sets_puts_full_list() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/mcaas/v1/clusters/c-1/machinesets")
        .match_query(Matcher::UrlEncoded("spaceID".into(), "space-1".into()))
        .match_body(Matcher::Json(json!([
            {"name": "worker", "machineBlueprintId": "mb-1", "count": 3}
        ])))
        .with_status(202)
        .create_async()
        .await;

    let pools = vec![MachineSet {
        name: "worker".to_string(),
        machine_blueprint_id: "mb-1".to_string(),
        count: 3,
        os_image: None,
        os_version: None,
    }];
    client_for(&server)
        .update_machine_sets(&token(), "c-1", "space-1", &pools)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_accepts_empty_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/mcaas/v1/clusters/c-1")
        .with_status(204)
        .create_async()
        .await;

    client_for(&server).delete_cluster(&token(), "c-1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_blueprint_lists_filter_by_site() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/mcaas/v1/clusterblueprints")
        .match_query(Matcher::UrlEncoded("field".into(), "applianceID eq site-1".into()))
        .with_status(200)
        .with_body(json!({"items": [{"id": "cbp-1", "name": "standard"}]}).to_string())
        .create_async()
        .await;

    let blueprints = client_for(&server)
        .list_cluster_blueprints(&token(), "site-1")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(blueprints[0].name, "standard");
}

#[tokio::test]
async fn test_kubeconfig_unwrapped_from_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/mcaas/v1/clusters/c-1/kubeconfig")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"kubeconfig": "apiVersion: v1\nkind: Config\n"}).to_string())
        .create_async()
        .await;

    let kubeconfig = client_for(&server).get_kubeconfig(&token(), "c-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(kubeconfig, "apiVersion: v1\nkind: Config\n");
}

#[tokio::test]
async fn test_kubeconfig_not_found_is_status_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/mcaas/v1/clusters/missing/kubeconfig")
        .with_status(404)
        .with_body(json!({"message": "cluster not found"}).to_string())
        .create_async()
        .await;

    let err = client_for(&server).get_kubeconfig(&token(), "missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("cluster not found"));
}

#[tokio::test]
async fn test_cluster_providers_listed_per_site() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/mcaas/v1/appliances/site-1/clusterproviders")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(
            json!({
                "items": [
                    {"id": "cp-1", "name": "ncs", "health": "ok", "kubernetesVersions": ["v1.28.4"]},
                    {"id": "cp-2", "name": "rke2"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let providers = client_for(&server)
        .list_cluster_providers(&token(), "site-1")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].health.as_deref(), Some("ok"));
    assert_eq!(providers[0].kubernetes_versions, vec!["v1.28.4"]);
    assert!(providers[1].kubernetes_versions.is_empty());
}
