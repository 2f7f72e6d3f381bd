//! Denormalized write plans.
//!
//! A message lives once per participant and a chat summary once per owner.
//! The backend offers no cross-entity transaction, so every logical action is
//! expressed as one atomic multi-path update.

use ardath_shared::models::{Chat, Message, MessageStatus, Record};
use ardath_shared::{paths, ChatId, MessageId, UserId};
use ardath_store::MultiPathUpdate;

use crate::error::{ClientError, Result};
use crate::session::Session;

/// What the user asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub other_user_id: UserId,
    pub chat_id: ChatId,
    /// Title of the chat as the sender sees it.
    pub chat_title: String,
    pub text: String,
    pub image_url: Option<String>,
}

impl OutgoingMessage {
    pub fn new(
        other_user_id: impl Into<UserId>,
        chat_id: impl Into<ChatId>,
        chat_title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            other_user_id: other_user_id.into(),
            chat_id: chat_id.into(),
            chat_title: chat_title.into(),
            text: text.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct SendPlan {
    /// The PENDING message written to both participants.
    pub message: Message,
    pub sender_chat: Chat,
    pub recipient_chat: Chat,
    pub update: MultiPathUpdate,
}

/// Build the six-path write for a new message.
pub fn plan_send(
    session: &Session,
    message_id: MessageId,
    outgoing: &OutgoingMessage,
    now_millis: i64,
) -> Result<SendPlan> {
    let text = outgoing.text.trim();
    if text.is_empty() {
        return Err(ClientError::EmptyMessage);
    }

    let me = &session.user_id;
    let other = &outgoing.other_user_id;
    let chat_id = &outgoing.chat_id;

    let message = Message {
        id: message_id,
        sender_id: me.clone(),
        sender_name: session.sender_name().to_string(),
        sender_image: session.photo_url.clone(),
        text: Some(text.to_string()),
        timestamp: now_millis,
        image_url: outgoing.image_url.clone(),
        status: MessageStatus::Pending,
    };
    let sender_chat = Chat {
        id: chat_id.clone(),
        user_id: other.clone(),
        title: outgoing.chat_title.clone(),
        last_message: text.to_string(),
        timestamp: now_millis,
    };
    let recipient_chat = Chat {
        id: chat_id.clone(),
        user_id: me.clone(),
        title: session.chat_title().to_string(),
        last_message: text.to_string(),
        timestamp: now_millis,
    };

    let payload = message.encode()?;
    let mut update = MultiPathUpdate::new();
    update
        .set(paths::message(chat_id, me, &message.id), payload.clone())
        .set(paths::message(chat_id, other, &message.id), payload)
        .set(paths::chat(me, chat_id), sender_chat.encode()?)
        .set(paths::chat(other, chat_id), recipient_chat.encode()?)
        .set(paths::membership(me, chat_id), true)
        .set(paths::membership(other, chat_id), true);

    Ok(SendPlan {
        message,
        sender_chat,
        recipient_chat,
        update,
    })
}

/// Remove `owner`'s summary and message copies of every chat. The
/// counterpart's copies are left alone.
pub fn plan_delete(owner: &UserId, chats: &[Chat]) -> MultiPathUpdate {
    let mut update = MultiPathUpdate::new();
    for chat in chats {
        update
            .delete(paths::chat(owner, &chat.id))
            .delete(paths::thread(&chat.id, owner));
    }
    update
}
