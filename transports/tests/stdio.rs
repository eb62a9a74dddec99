#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use courier_core::controller::Crud;
use courier_core::transport::{RemoteCall, RemoteResult, Transport, TransportError};
use courier_core::Controllers;
use courier_transports::StdioTransport;
use serde_json::json;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Writes a shell backend and returns a transport running it through `/bin/sh`.
///
/// Going through the interpreter avoids exec'ing a file this process just wrote.
fn backend(dir: &TempDir, name: &str, script: &str) -> StdioTransport {
    let path: PathBuf = dir.path().join(name);
    std::fs::write(&path, script).unwrap();
    StdioTransport::new("/bin/sh").args([path.to_string_lossy().into_owned()])
}

fn call(command: &str, params: serde_json::Value) -> RemoteCall {
    RemoteCall::new(command, params).unwrap()
}

#[tokio::test]
async fn backend_receives_the_request_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "echo.sh",
        r#"request=$(cat)
printf '{"success":true,"data":%s}' "$request"
"#,
    );

    let result = transport
        .invoke(call("get_task", json!({ "id": "t1" })))
        .await
        .unwrap();

    assert_eq!(
        result,
        RemoteResult::success(json!({ "command": "get_task", "params": { "id": "t1" } }))
    );
}

#[tokio::test]
async fn failure_result_with_nonzero_exit_is_a_rejection() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "reject.sh",
        r#"cat > /dev/null
echo "looking up task" >&2
printf '{"success":false,"error":"no such task"}'
exit 1
"#,
    );

    let result = transport.invoke(call("get_task", json!({ "id": "t1" }))).await.unwrap();

    assert_eq!(result, RemoteResult::failure("no such task"));
}

#[tokio::test]
async fn crash_is_a_process_failure_with_stderr() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "crash.sh",
        r#"cat > /dev/null
echo "panicked at src/main.rs" >&2
exit 3
"#,
    );

    let err = transport.invoke(call("get_version", json!({}))).await.unwrap_err();

    match err {
        TransportError::ProcessFailed { status, stderr } => {
            assert_eq!(status.code(), Some(3));
            assert!(stderr.contains("panicked"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_with_success_json_is_a_process_failure() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "confused.sh",
        r#"cat > /dev/null
printf '{"success":true,"data":1}'
exit 2
"#,
    );

    let err = transport.invoke(call("get_version", json!({}))).await.unwrap_err();

    assert!(matches!(err, TransportError::ProcessFailed { .. }));
}

#[tokio::test]
async fn garbage_output_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(&dir, "garbage.sh", "cat > /dev/null\necho 'ready.'\n");

    let err = transport.invoke(call("health_check", json!({}))).await.unwrap_err();

    assert!(matches!(err, TransportError::MalformedResponse { ref command, .. } if command == "health_check"));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(&dir, "slow.sh", "sleep 5\n").timeout(Duration::from_millis(200));

    let err = transport.invoke(call("get_version", json!({}))).await.unwrap_err();

    match err {
        TransportError::Timeout { command, after } => {
            assert_eq!(command, "get_version");
            assert_eq!(after, Duration::from_millis(200));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_program_is_unavailable_every_time() {
    let dir = tempfile::tempdir().unwrap();
    let transport = StdioTransport::new(dir.path().join("no-such-backend"));

    for _ in 0..2 {
        let err = transport.invoke(call("get_version", json!({}))).await.unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}

#[tokio::test]
async fn bare_program_name_is_found_on_path() {
    let transport = StdioTransport::new("sh").args([
        "-c",
        r#"cat > /dev/null; printf '{"success":true,"data":"from-path"}'"#,
    ]);

    let result = transport.invoke(call("get_version", json!({}))).await.unwrap();

    assert_eq!(result, RemoteResult::success(json!("from-path")));
}

#[tokio::test]
async fn environment_is_passed_to_backend() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "env.sh",
        r#"cat > /dev/null
printf '{"success":true,"data":"%s"}' "$COURIER_PROFILE"
"#,
    )
    .envs([("COURIER_PROFILE".to_string(), "staging".to_string())].into());

    let result = transport.invoke(call("get_version", json!({}))).await.unwrap();

    assert_eq!(result, RemoteResult::success(json!("staging")));
}

#[tokio::test]
async fn controllers_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let transport = backend(
        &dir,
        "backend.sh",
        r#"request=$(cat)
case "$request" in
  *'"command":"get_version"'*) printf '{"success":true,"data":"3.1.4"}' ;;
  *'"command":"health_check"'*) printf '{"success":true}' ;;
  *'"command":"get_conversation"'*) printf '{"success":true,"data":{"id":"c1","title":"Standup","type":"Group"}}' ;;
  *) printf '{"success":false,"error":"unknown command"}'; exit 1 ;;
esac
"#,
    );
    let controllers = Controllers::new(Arc::new(transport));

    assert_eq!(controllers.system.get_version().await.unwrap(), "3.1.4");
    assert!(controllers.system.health_check().await);
    let conversation = controllers.conversations.get("c1").await.unwrap();
    assert_eq!(conversation.title.as_deref(), Some("Standup"));

    let err = controllers.tasks.get("t1").await.unwrap_err();
    assert_eq!(err.as_controller().unwrap().message(), "unknown command");
}
