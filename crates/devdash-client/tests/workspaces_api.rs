//! Workspaces API tests against a mocked dashboard backend.

use devdash_client::{DevdashClient, Error, Phase, Workspace};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NS: &str = "alice-che";

fn workspace_json(name: &str, started: Option<bool>, phase: Option<&str>) -> Value {
    let mut ws = json!({
        "apiVersion": "workspace.devfile.io/v1alpha2",
        "kind": "DevWorkspace",
        "metadata": {
            "name": name,
            "namespace": NS,
            "uid": format!("uid-{name}"),
            "resourceVersion": "100"
        },
        "spec": {}
    });
    if let Some(started) = started {
        ws["spec"]["started"] = json!(started);
    }
    if let Some(phase) = phase {
        ws["status"] = json!({ "phase": phase });
    }
    ws
}

async fn client_for(server: &MockServer) -> DevdashClient {
    DevdashClient::builder()
        .base_url(server.uri())
        .auth_token("test-token")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_list_returns_items_and_resource_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "workspace.devfile.io/v1alpha2",
            "kind": "DevWorkspaceList",
            "metadata": { "resourceVersion": "12345" },
            "items": [
                workspace_json("one", Some(true), Some("RUNNING")),
                workspace_json("two", Some(false), Some("STOPPED")),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = client_for(&server).await.workspaces().list(NS).await.unwrap();

    assert_eq!(list.metadata.resource_version.as_deref(), Some("12345"));
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.items[0].phase(), Phase::Running);
    assert_eq!(list.items[1].name(), "two");
}

#[tokio::test]
async fn test_get_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "statusCode": 404,
            "error": "Not Found",
            "message": "devworkspace ghost not found"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .workspaces()
        .get(NS, "ghost")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "token expired"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .workspaces()
        .list(NS)
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .workspaces()
        .delete(NS, "demo")
        .await
        .unwrap_err();
    assert!(err.is_server_error());
    assert!(matches!(err, Error::Api { status: 502, ref code, .. } if code == "unknown"));
}

#[tokio::test]
async fn test_create_wraps_devworkspace() {
    let server = MockServer::start().await;
    let new_ws = Workspace::new(NS, "fresh").with_started(true);
    Mock::given(method("POST"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces"))
        .and(body_json(json!({
            "devworkspace": {
                "apiVersion": "workspace.devfile.io/v1alpha2",
                "kind": "DevWorkspace",
                "metadata": { "name": "fresh", "namespace": NS },
                "spec": { "started": true }
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(workspace_json("fresh", Some(true), None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server)
        .await
        .workspaces()
        .create(NS, new_ws)
        .await
        .unwrap();
    assert_eq!(created.id(), "uid-fresh");
    assert_eq!(created.phase(), Phase::Starting);
}

#[tokio::test]
async fn test_start_adds_missing_started_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_json("demo", None, None)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .and(body_json(json!([
            { "op": "add", "path": "/spec/started", "value": true }
        ])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workspace_json("demo", Some(true), Some("STARTING"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ws = client_for(&server)
        .await
        .workspaces()
        .start(NS, "demo")
        .await
        .unwrap();
    assert_eq!(ws.phase(), Phase::Starting);
}

#[tokio::test]
async fn test_stop_replaces_started_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workspace_json("demo", Some(true), Some("RUNNING"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .and(body_json(json!([
            { "op": "replace", "path": "/spec/started", "value": false }
        ])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workspace_json("demo", Some(false), Some("STOPPING"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ws = client_for(&server)
        .await
        .workspaces()
        .stop(NS, "demo")
        .await
        .unwrap();
    assert_eq!(ws.phase(), Phase::Stopping);
}

#[tokio::test]
async fn test_status_propagates_failure_message() {
    let server = MockServer::start().await;
    let mut body = workspace_json("broken", Some(true), Some("FAILED"));
    body["status"]["message"] = json!("Container tools has state CrashLoopBackOff");
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .workspaces()
        .status(NS, "broken")
        .await
        .unwrap_err();

    match err {
        Error::WorkspaceFailed { name, message } => {
            assert_eq!(name, "broken");
            assert_eq!(message, "Container tools has state CrashLoopBackOff");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_status_of_running_workspace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/namespace/alice-che/devworkspaces/demo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workspace_json("demo", Some(true), Some("RUNNING"))),
        )
        .mount(&server)
        .await;

    let phase = client_for(&server)
        .await
        .workspaces()
        .status(NS, "demo")
        .await
        .unwrap();
    assert_eq!(phase, Phase::Running);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.health().is_healthy().await);
}

#[tokio::test]
async fn test_health_check_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.health().check().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));
}
