use std::sync::Arc;

use serde::Serialize;

use crate::entity::{
    Conversation, ConversationFilter, ConversationUpdate, EntityKind, NewConversation, Participant,
};
use crate::error::Error;
use crate::transport::Transport;

use super::{invoke, invoke_unit, Crud};

#[derive(Clone)]
pub struct ConversationController {
    transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
struct ConversationParams<'a> {
    conversation_id: &'a str,
}

#[derive(Serialize)]
struct MembershipParams<'a> {
    conversation_id: &'a str,
    user_id: &'a str,
}

impl ConversationController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `get_conversation_participants` with `{conversation_id}`.
    pub async fn get_participants(&self, conversation_id: &str) -> Result<Vec<Participant>, Error> {
        invoke(
            self.transport.as_ref(),
            "get_conversation_participants",
            ConversationParams { conversation_id },
        )
        .await
    }

    /// `add_conversation_participant` with `{conversation_id, user_id}`.
    pub async fn add_participant(&self, conversation_id: &str, user_id: &str) -> Result<(), Error> {
        invoke_unit(
            self.transport.as_ref(),
            "add_conversation_participant",
            MembershipParams { conversation_id, user_id },
        )
        .await
    }

    /// `remove_conversation_participant` with `{conversation_id, user_id}`.
    pub async fn remove_participant(&self, conversation_id: &str, user_id: &str) -> Result<(), Error> {
        invoke_unit(
            self.transport.as_ref(),
            "remove_conversation_participant",
            MembershipParams { conversation_id, user_id },
        )
        .await
    }
}

impl Crud for ConversationController {
    type Record = Conversation;
    type Create = NewConversation;
    type Update = ConversationUpdate;
    type Filter = ConversationFilter;

    fn kind(&self) -> EntityKind {
        EntityKind::Conversation
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn participant_operations_use_compound_commands() {
        let transport = Arc::new(ScriptedTransport::new());
        let conversations = ConversationController::new(transport.clone());
        transport
            .respond(
                "get_conversation_participants",
                json!([{ "user_id": "u1", "display_name": "Ada" }]),
            )
            .respond("add_conversation_participant", json!(null))
            .respond("remove_conversation_participant", json!(null));

        let participants = conversations.get_participants("c1").await.unwrap();
        conversations.add_participant("c1", "u2").await.unwrap();
        conversations.remove_participant("c1", "u1").await.unwrap();

        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].display_name.as_deref(), Some("Ada"));
        let calls = transport.calls();
        assert_eq!(calls[0].params(), json!({ "conversation_id": "c1" }).as_object().unwrap());
        assert_eq!(
            calls[1].params(),
            json!({ "conversation_id": "c1", "user_id": "u2" }).as_object().unwrap()
        );
        assert_eq!(calls[2].command(), "remove_conversation_participant");
    }
}
