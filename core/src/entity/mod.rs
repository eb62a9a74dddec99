//! Entity kinds and the records exchanged with the backend.
//!
//! Records are plain data. Every mutation goes through a controller call that
//! returns the new or updated record. Fields the backend sends that are not
//! modelled here are kept in each record's `extra` map. Known optional fields
//! are normalised on the way back out: an explicit `null` or an empty list is
//! written as an absent key. Use
//! [`RawController`](crate::controller::RawController) when the backend's
//! JSON has to come back exactly as sent.

mod model;

pub use model::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The entity kinds the backend exposes generic CRUD commands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Conversation,
    Message,
    Task,
    Plan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudVerb {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Conversation,
        EntityKind::Message,
        EntityKind::Task,
        EntityKind::Plan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Conversation => "conversation",
            EntityKind::Message => "message",
            EntityKind::Task => "task",
            EntityKind::Plan => "plan",
        }
    }

    /// Backend command implementing `verb` for this kind.
    pub fn command(self, verb: CrudVerb) -> &'static str {
        use CrudVerb::*;
        use EntityKind::*;
        match (self, verb) {
            (Conversation, Get) => "get_conversation",
            (Conversation, List) => "list_conversations",
            (Conversation, Create) => "create_conversation",
            (Conversation, Update) => "update_conversation",
            (Conversation, Delete) => "delete_conversation",
            (Message, Get) => "get_message",
            (Message, List) => "list_messages",
            (Message, Create) => "create_message",
            (Message, Update) => "update_message",
            (Message, Delete) => "delete_message",
            (Task, Get) => "get_task",
            (Task, List) => "list_tasks",
            (Task, Create) => "create_task",
            (Task, Update) => "update_task",
            (Task, Delete) => "delete_task",
            (Plan, Get) => "get_plan",
            (Plan, List) => "list_plans",
            (Plan, Create) => "create_plan",
            (Plan, Update) => "update_plan",
            (Plan, Delete) => "delete_plan",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type served by the generic CRUD commands of one [`EntityKind`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Payload of `create_<kind>`.
    type Create: Serialize + Send + Sync;
    /// Payload of `update_<kind>`.
    type Update: Serialize + Send + Sync;
    /// Filter accepted by `list_<kind>s`.
    type Filter: Serialize + Send + Sync;

    fn id(&self) -> &str;
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
