use std::sync::Arc;
use std::time::Duration;

use courier_core::controller::Crud;
use courier_core::entity::{StatusChange, TaskStatus};
use courier_core::transport::{RemoteCall, RemoteResult, Transport, TransportError};
use courier_core::Controllers;
use courier_transports::{HttpOptions, HttpTransport};
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::json;

fn transport_for(server: &MockServer, options: HttpOptions) -> HttpTransport {
    HttpTransport::new(&server.url("/api"), options).unwrap()
}

#[test]
fn endpoint_is_appended_to_base_path() {
    let transport = HttpTransport::new("http://127.0.0.1:7000/api", HttpOptions::default()).unwrap();
    assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:7000/api/invoke");

    let transport = HttpTransport::new("http://127.0.0.1:7000/", HttpOptions::default()).unwrap();
    assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:7000/invoke");
}

#[test]
fn invalid_url_is_rejected_at_construction() {
    assert!(HttpTransport::new("not a url", HttpOptions::default()).is_err());
}

#[tokio::test]
async fn posts_envelope_and_decodes_result() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/invoke")
                .json_body(json!({ "command": "get_task", "params": { "id": "t1" } }));
            then.status(200)
                .json_body(json!({ "success": true, "data": { "id": "t1", "title": "Ship it" } }));
        })
        .await;
    let transport = transport_for(&server, HttpOptions::default());

    let result = transport
        .invoke(RemoteCall::new("get_task", json!({ "id": "t1" })).unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result, RemoteResult::success(json!({ "id": "t1", "title": "Ship it" })));
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/invoke")
                .header("authorization", "Bearer s3cr3t");
            then.status(200).json_body(json!({ "success": true, "data": "1.0.0" }));
        })
        .await;
    let options = HttpOptions {
        token: Some(SecretString::from("s3cr3t".to_string())),
        ..Default::default()
    };
    let controllers = Controllers::new(Arc::new(transport_for(&server, options)));

    assert_eq!(controllers.system.get_version().await.unwrap(), "1.0.0");
    mock.assert_async().await;
}

#[tokio::test]
async fn failure_body_on_error_status_is_a_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/invoke");
            then.status(404)
                .json_body(json!({ "success": false, "error": "Task 123 not found" }));
        })
        .await;
    let controllers = Controllers::new(Arc::new(transport_for(&server, HttpOptions::default())));

    let change = StatusChange { id: "123".into(), status: TaskStatus::Completed };
    let err = controllers.tasks.update_status(&change).await.unwrap_err();

    assert_eq!(err.as_controller().unwrap().message(), "Task 123 not found");
}

#[tokio::test]
async fn other_error_status_is_a_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/invoke");
            then.status(502).body("Bad Gateway");
        })
        .await;
    let controllers = Controllers::new(Arc::new(transport_for(&server, HttpOptions::default())));

    let err = controllers.plans.get("p1").await.unwrap_err();

    match err.as_transport() {
        Some(TransportError::Status { status, body }) => {
            assert_eq!(*status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!controllers.system.health_check().await);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/invoke");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "success": true }));
        })
        .await;
    let options = HttpOptions {
        timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let transport = transport_for(&server, options);

    let err = transport
        .invoke(RemoteCall::new("health_check", ()).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    // Port 9 (discard) is essentially never listening on loopback.
    let transport = HttpTransport::new("http://127.0.0.1:9", HttpOptions::default()).unwrap();

    let err = transport
        .invoke(RemoteCall::new("health_check", ()).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Unavailable(_)));
}
