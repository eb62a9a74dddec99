use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{RemoteCall, RemoteResult, Transport, TransportError};

type Handler = Box<dyn Fn(&RemoteCall) -> Result<RemoteResult, TransportError> + Send + Sync>;

/// In-memory [`Transport`] that answers from a script and records every call.
///
/// Queued responses for a command are consumed first, in order. Once the
/// queue for a command is empty, a handler registered with [`on`](Self::on)
/// answers. A call with neither fails with [`TransportError::Unavailable`],
/// as if no backend handler were registered.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<RemoteResult, TransportError>>>>,
    handlers: Mutex<HashMap<String, Handler>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler answering every call to `command` not covered by a queued response.
    pub fn on<F>(&self, command: &str, handler: F) -> &Self
    where
        F: Fn(&RemoteCall) -> Result<RemoteResult, TransportError> + Send + Sync + 'static,
    {
        lock(&self.handlers).insert(command.to_string(), Box::new(handler));
        self
    }

    /// Queues a successful result carrying `data`.
    pub fn respond(&self, command: &str, data: Value) -> &Self {
        self.enqueue(command, Ok(RemoteResult::success(data)))
    }

    /// Queues a backend-reported failure.
    pub fn reject(&self, command: &str, error: &str) -> &Self {
        self.enqueue(command, Ok(RemoteResult::failure(error)))
    }

    /// Queues a channel failure.
    pub fn break_channel(&self, command: &str, error: TransportError) -> &Self {
        self.enqueue(command, Err(error))
    }

    pub fn enqueue(&self, command: &str, outcome: Result<RemoteResult, TransportError>) -> &Self {
        lock(&self.queued)
            .entry(command.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, command: &str) -> Vec<RemoteCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.command() == command)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, command: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.command() == command)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn invoke(&self, call: RemoteCall) -> Result<RemoteResult, TransportError> {
        lock(&self.calls).push(call.clone());

        let queued = lock(&self.queued)
            .get_mut(call.command())
            .and_then(VecDeque::pop_front);
        if let Some(outcome) = queued {
            return outcome;
        }

        match lock(&self.handlers).get(call.command()) {
            Some(handler) => handler(&call),
            None => Err(TransportError::Unavailable(format!(
                "no scripted response for '{}'",
                call.command()
            ))),
        }
    }
}

// A panic inside a handler must not wedge every later test assertion.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn queued_responses_precede_handler() {
        let transport = ScriptedTransport::new();
        transport
            .on("get_version", |_| Ok(RemoteResult::success(json!("fallback"))))
            .respond("get_version", json!("first"));

        let first = transport.invoke(RemoteCall::new("get_version", ()).unwrap()).await.unwrap();
        let second = transport.invoke(RemoteCall::new("get_version", ()).unwrap()).await.unwrap();

        assert_eq!(first, RemoteResult::success(json!("first")));
        assert_eq!(second, RemoteResult::success(json!("fallback")));
        assert_eq!(transport.call_count("get_version"), 2);
    }

    #[tokio::test]
    async fn unscripted_command_is_unavailable() {
        let transport = ScriptedTransport::new();
        let err = transport
            .invoke(RemoteCall::new("get_task", json!({ "id": "1" })).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
        assert_eq!(transport.calls().len(), 1);
    }
}
