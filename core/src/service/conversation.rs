use serde::Serialize;
use serde_json::json;

use crate::controller::{ConversationController, Crud, MessageController};
use crate::entity::{
    Conversation, ConversationType, Message, MessageContent, NewConversation, NewMessage, Page,
    PageRequest, Participant,
};

use super::{handle_error, ServiceError};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StartedConversation {
    pub conversation: Conversation,
    pub message: Message,
}

/// Everything a conversation screen needs on open.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub participants: Vec<Participant>,
    pub messages: Page<Message>,
}

#[derive(Clone)]
pub struct ConversationService {
    conversations: ConversationController,
    messages: MessageController,
}

impl ConversationService {
    pub fn new(conversations: ConversationController, messages: MessageController) -> Self {
        Self { conversations, messages }
    }

    /// Creates a conversation, then posts its first message.
    ///
    /// Not atomic. If posting the message fails, the conversation has already
    /// been created and is left as is; the returned error is the message
    /// failure.
    pub async fn start_conversation(
        &self,
        title: &str,
        kind: ConversationType,
        content: MessageContent,
    ) -> Result<StartedConversation, ServiceError> {
        let on_error = || handle_error("start_conversation", json!({ "title": title, "type": kind }));

        let conversation = self
            .conversations
            .create(&NewConversation::new(title, kind))
            .await
            .map_err(on_error())?;

        let input = NewMessage {
            conversation_id: conversation.id.clone(),
            content,
            sender_id: None,
        };
        let message = self.messages.create(&input).await.map_err(on_error())?;

        tracing::info!(conversation_id = %conversation.id, "Started conversation");
        Ok(StartedConversation { conversation, message })
    }

    /// Loads a conversation with its participants and first page of messages.
    ///
    /// The three reads are issued concurrently; the first failure wins.
    pub async fn open_conversation(
        &self,
        id: &str,
        page: PageRequest,
    ) -> Result<ConversationView, ServiceError> {
        let (conversation, participants, messages) = futures::try_join!(
            self.conversations.get(id),
            self.conversations.get_participants(id),
            self.messages.list_for_conversation(id, page),
        )
        .map_err(handle_error("open_conversation", json!({ "id": id })))?;

        Ok(ConversationView {
            conversation,
            participants,
            messages,
        })
    }

    /// Adds participants one by one, stopping at the first failure.
    ///
    /// Participants added before the failure stay in the conversation.
    pub async fn invite(&self, conversation_id: &str, user_ids: &[String]) -> Result<(), ServiceError> {
        for user_id in user_ids {
            self.conversations
                .add_participant(conversation_id, user_id)
                .await
                .map_err(handle_error(
                    "invite",
                    json!({ "conversation_id": conversation_id, "user_id": user_id }),
                ))?;
        }
        tracing::info!(conversation_id, count = user_ids.len(), "Invited participants");
        Ok(())
    }
}
