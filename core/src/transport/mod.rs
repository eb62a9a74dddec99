//! The remote-call boundary between application code and the native backend.
//!
//! A [`RemoteCall`] names a backend-registered command and carries a JSON
//! object of parameters. A [`Transport`] delivers the call and hands back
//! exactly one [`RemoteResult`], or a [`TransportError`] when the channel
//! itself failed.
//!
//! # Wire format
//!
//! * **Request:** `{"command": "get_conversation", "params": {"id": "..."}}`
//! * **Success:** `{"success": true, "data": ...}`
//! * **Failure:** `{"success": false, "error": "...", "details": {...}}`
//!
//! The two failure classes are deliberately distinct. A backend handler that
//! ran and reported a problem produces `Ok(RemoteResult::Failure { .. })`.
//! Anything that prevented the handler from answering at all (process not
//! running, I/O, serialization, timeout, garbage on the wire) produces
//! `Err(TransportError)`.

mod scripted;

pub use scripted::ScriptedTransport;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

static COMMAND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("command name pattern is valid"));

/// Delivers remote calls to a backend.
///
/// Implementations resolve each call exactly once. They must not retry and
/// must not cache; timeouts, if any, are theirs to enforce and are reported
/// as [`TransportError::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, call: RemoteCall) -> Result<RemoteResult, TransportError>;
}

/// A single request to the backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteCall {
    #[serde(skip)]
    id: Uuid,
    command: String,
    params: Map<String, Value>,
}

impl RemoteCall {
    /// Builds a call, serializing `params` into a JSON object.
    ///
    /// `()` and `None` are accepted and produce an empty parameter object.
    pub fn new(command: impl Into<String>, params: impl Serialize) -> Result<Self, TransportError> {
        let command = command.into();
        if !COMMAND_NAME.is_match(&command) {
            return Err(TransportError::InvalidCommand(command));
        }
        let params = match serde_json::to_value(params).map_err(TransportError::Serialization)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(TransportError::InvalidParams {
                    command,
                    found: json_type_name(&other),
                });
            }
        };
        Ok(Self {
            id: Uuid::new_v4(),
            command,
            params,
        })
    }

    /// Local correlation id. Never sent to the backend.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Serializes the request envelope.
    pub fn to_json(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(TransportError::Serialization)
    }
}

/// Outcome of a remote call whose handler actually ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireResult", into = "WireResult")]
pub enum RemoteResult {
    Success { data: Value },
    Failure { error: String, details: Option<Value> },
}

impl RemoteResult {
    pub fn success(data: Value) -> Self {
        RemoteResult::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        RemoteResult::Failure {
            error: error.into(),
            details: None,
        }
    }

    pub fn failure_with_details(error: impl Into<String>, details: Value) -> Self {
        RemoteResult::Failure {
            error: error.into(),
            details: Some(details),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResult::Success { .. })
    }

    /// Decodes a result from the backend's JSON encoding.
    pub fn from_slice(command: &str, bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::MalformedResponse {
            command: command.to_string(),
            reason: format!("{} (response: '{}')", e, preview(bytes)),
        })
    }
}

// Boolean-discriminated form used on the wire.
#[derive(Serialize, Deserialize)]
struct WireResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl TryFrom<WireResult> for RemoteResult {
    type Error = String;

    fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
        if wire.success {
            Ok(RemoteResult::Success {
                data: wire.data.unwrap_or(Value::Null),
            })
        } else {
            match wire.error {
                Some(error) => Ok(RemoteResult::Failure {
                    error,
                    details: wire.details,
                }),
                None => Err("failed result is missing the `error` message".to_string()),
            }
        }
    }
}

impl From<RemoteResult> for WireResult {
    fn from(result: RemoteResult) -> Self {
        match result {
            RemoteResult::Success { data } => WireResult {
                success: true,
                data: Some(data),
                error: None,
                details: None,
            },
            RemoteResult::Failure { error, details } => WireResult {
                success: false,
                data: None,
                error: Some(error),
                details,
            },
        }
    }
}

/// The remote-call channel itself failed. The backend handler did not answer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid command name '{0}'")]
    InvalidCommand(String),

    #[error("Parameters for '{command}' must serialize to a JSON object, found {found}")]
    InvalidParams { command: String, found: &'static str },

    #[error("Failed to serialize remote call: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error while talking to the backend: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend process exited with status {status}. Stderr: {stderr}")]
    ProcessFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Call to '{command}' timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Backend responded with HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response to '{command}': {reason}")]
    MalformedResponse { command: String, reason: String },
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).chars().take(100).collect()
}
