//! Typed controllers over the remote-call boundary.
//!
//! [`Crud`] is the shared base: five generic operations whose command names
//! come from the controller's [`EntityKind`]. Domain controllers implement it
//! and add their own explicitly named operations on top. Controllers hold no
//! state besides a shared [`Transport`] handle, so they are cheap to clone and
//! safe to share between tasks.
//!
//! Every method maps a backend-reported failure to [`ControllerError`] carrying
//! the backend's message verbatim. Transport failures are passed through
//! unchanged as [`Error::Transport`].

mod conversation;
mod message;
mod system;
mod task;

pub use conversation::ConversationController;
pub use message::MessageController;
pub use system::SystemController;
pub use task::TaskController;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::entity::{CrudVerb, Entity, EntityKind, Page, Plan};
use crate::error::Error;
use crate::service::{ConversationService, TaskService};
use crate::transport::{RemoteCall, RemoteResult, Transport};

/// The backend handler ran and reported failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ControllerError {
    command: String,
    message: String,
    details: Option<Value>,
}

impl ControllerError {
    pub fn new(command: impl Into<String>, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            details,
        }
    }

    /// Command that was rejected.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The backend's error message, unmodified.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

/// Generic CRUD operations for one entity kind.
///
/// Implementors only supply the associated types, [`kind`](Crud::kind) and
/// [`transport`](Crud::transport); the operations themselves are provided.
///
/// | Method   | Command          | Params         |
/// |----------|------------------|----------------|
/// | `get`    | `get_<e>`        | `{id}`         |
/// | `list`   | `list_<e>s`      | `{filter}`     |
/// | `create` | `create_<e>`     | `{input}`      |
/// | `update` | `update_<e>`     | `{id, data}`   |
/// | `delete` | `delete_<e>`     | `{id}`         |
#[async_trait]
pub trait Crud: Send + Sync {
    type Record: DeserializeOwned + Send;
    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;
    type Filter: Serialize + Send + Sync;

    fn kind(&self) -> EntityKind;

    fn transport(&self) -> &dyn Transport;

    async fn get(&self, id: &str) -> Result<Self::Record, Error> {
        let command = self.kind().command(CrudVerb::Get);
        invoke(self.transport(), command, IdParams { id }).await
    }

    /// Lists records. Without a filter the `filter` key is left out entirely.
    async fn list(&self, filter: Option<&Self::Filter>) -> Result<Page<Self::Record>, Error> {
        let command = self.kind().command(CrudVerb::List);
        invoke(self.transport(), command, ListParams { filter }).await
    }

    async fn create(&self, input: &Self::Create) -> Result<Self::Record, Error> {
        let command = self.kind().command(CrudVerb::Create);
        invoke(self.transport(), command, CreateParams { input }).await
    }

    async fn update(&self, id: &str, data: &Self::Update) -> Result<Self::Record, Error> {
        let command = self.kind().command(CrudVerb::Update);
        invoke(self.transport(), command, UpdateParams { id, data }).await
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let command = self.kind().command(CrudVerb::Delete);
        invoke_unit(self.transport(), command, IdParams { id }).await
    }
}

/// Base controller for entity kinds without extra operations.
pub struct EntityController<T> {
    transport: Arc<dyn Transport>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityController<T> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _record: PhantomData,
        }
    }
}

impl<T> Clone for EntityController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Entity> Crud for EntityController<T> {
    type Record = T;
    type Create = T::Create;
    type Update = T::Update;
    type Filter = T::Filter;

    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

pub type PlanController = EntityController<Plan>;

/// Untyped controller passing JSON through in both directions.
///
/// Useful where the caller already holds JSON (scripts, the CLI) or wants the
/// backend's payload exactly as sent.
#[derive(Clone)]
pub struct RawController {
    kind: EntityKind,
    transport: Arc<dyn Transport>,
}

impl RawController {
    pub fn new(kind: EntityKind, transport: Arc<dyn Transport>) -> Self {
        Self { kind, transport }
    }
}

impl Crud for RawController {
    type Record = Value;
    type Create = Value;
    type Update = Value;
    type Filter = Value;

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

/// One controller per domain, all sharing a single transport.
#[derive(Clone)]
pub struct Controllers {
    pub conversations: ConversationController,
    pub messages: MessageController,
    pub tasks: TaskController,
    pub plans: PlanController,
    pub system: SystemController,
}

impl Controllers {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            conversations: ConversationController::new(transport.clone()),
            messages: MessageController::new(transport.clone()),
            tasks: TaskController::new(transport.clone()),
            plans: PlanController::new(transport.clone()),
            system: SystemController::new(transport),
        }
    }

    pub fn conversation_service(&self) -> ConversationService {
        ConversationService::new(self.conversations.clone(), self.messages.clone())
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.tasks.clone())
    }
}

// --- Parameter shapes shared by the CRUD commands ---

#[derive(Serialize)]
struct IdParams<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct ListParams<'a, F> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a F>,
}

#[derive(Serialize)]
struct CreateParams<'a, I> {
    input: &'a I,
}

#[derive(Serialize)]
struct UpdateParams<'a, D> {
    id: &'a str,
    data: &'a D,
}

// --- Dispatch helpers ---

/// Issues one call and returns the `data` payload, or the backend's rejection.
pub(crate) async fn invoke_raw<P>(
    transport: &dyn Transport,
    command: &str,
    params: P,
) -> Result<Value, Error>
where
    P: Serialize + Send,
{
    let call = RemoteCall::new(command, params)?;
    let call_id = call.id();
    tracing::debug!(%call_id, command, "Issuing remote call");

    match transport.invoke(call).await? {
        RemoteResult::Success { data } => {
            tracing::trace!(%call_id, command, "Remote call succeeded");
            Ok(data)
        }
        RemoteResult::Failure { error, details } => {
            tracing::warn!(%call_id, command, "Backend rejected call: {}", error);
            Err(ControllerError::new(command, error, details).into())
        }
    }
}

/// Like [`invoke_raw`], decoding `data` into `R`.
pub(crate) async fn invoke<R, P>(transport: &dyn Transport, command: &str, params: P) -> Result<R, Error>
where
    R: DeserializeOwned,
    P: Serialize + Send,
{
    let data = invoke_raw(transport, command, params).await?;
    serde_json::from_value(data).map_err(|source| Error::Decode {
        command: command.to_string(),
        source,
    })
}

/// Like [`invoke_raw`] for commands whose `data` carries no meaning.
pub(crate) async fn invoke_unit<P>(transport: &dyn Transport, command: &str, params: P) -> Result<(), Error>
where
    P: Serialize + Send,
{
    invoke_raw(transport, command, params).await.map(|_| ())
}
