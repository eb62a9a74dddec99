use std::sync::Arc;

use serde::Serialize;

use crate::entity::{EntityKind, Message, MessageFilter, MessageUpdate, NewMessage, Page, PageRequest};
use crate::error::Error;
use crate::transport::Transport;

use super::{invoke, invoke_unit, Crud};

#[derive(Clone)]
pub struct MessageController {
    transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
struct ConversationMessagesParams<'a> {
    conversation_id: &'a str,
    #[serde(flatten)]
    page: PageRequest,
}

#[derive(Serialize)]
struct ReadReceiptParams<'a> {
    message_id: &'a str,
}

impl MessageController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Messages of one conversation, newest window first as ordered by the backend.
    pub async fn list_for_conversation(
        &self,
        conversation_id: &str,
        page: PageRequest,
    ) -> Result<Page<Message>, Error> {
        invoke(
            self.transport.as_ref(),
            "get_conversation_messages",
            ConversationMessagesParams { conversation_id, page },
        )
        .await
    }

    /// Read receipt: `mark_message_read` with `{message_id}`.
    pub async fn mark_as_read(&self, message_id: &str) -> Result<(), Error> {
        invoke_unit(
            self.transport.as_ref(),
            "mark_message_read",
            ReadReceiptParams { message_id },
        )
        .await
    }
}

impl Crud for MessageController {
    type Record = Message;
    type Create = NewMessage;
    type Update = MessageUpdate;
    type Filter = MessageFilter;

    fn kind(&self) -> EntityKind {
        EntityKind::Message
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}
