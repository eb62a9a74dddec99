//! Workflow-level operations composed from several controller calls.
//!
//! Services add no transactional guarantees: a workflow that fails halfway
//! leaves the effects of the calls that already succeeded in place. Every
//! failure is returned as a [`ServiceError`] naming the operation and its
//! arguments, with the controller's [`Error`] preserved inside.

mod conversation;
mod task;

pub use conversation::{ConversationService, ConversationView, StartedConversation};
pub use task::TaskService;

use serde_json::Value;
use thiserror::Error;

use crate::error::Error;

#[derive(Error, Debug)]
#[error("{operation} failed: {source}")]
pub struct ServiceError {
    operation: &'static str,
    args: Value,
    #[source]
    source: Error,
}

impl ServiceError {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Arguments the operation was called with, for diagnostics.
    pub fn args(&self) -> &Value {
        &self.args
    }

    /// The underlying controller failure.
    pub fn inner(&self) -> &Error {
        &self.source
    }

    pub fn into_inner(self) -> Error {
        self.source
    }
}

/// Returns a mapper attaching operation context to a controller failure and logging it.
pub(crate) fn handle_error(operation: &'static str, args: Value) -> impl FnOnce(Error) -> ServiceError {
    move |source| {
        tracing::error!(operation, args = %args, "Service operation failed: {}", source);
        ServiceError {
            operation,
            args,
            source,
        }
    }
}
