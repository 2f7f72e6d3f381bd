//! Chat and message operations for the signed-in user.

use std::collections::BTreeMap;
use std::sync::Arc;

use ardath_shared::models::{Chat, Message, MessageStatus};
use ardath_shared::{paths, ChatId, MessageId, UserId};
use ardath_store::{DbPath, Query, RemoteStore};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::fanout::{plan_delete, plan_send, OutgoingMessage};
use crate::listeners::{self, ChatFeed, FeedUpdate};
use crate::platform::{NotificationDispatcher, PushNotification};
use crate::resource::{ChannelStream, Resource};
use crate::session::Session;
use crate::status::StatusReconciler;

pub struct ChatRepository {
    store: Arc<dyn RemoteStore>,
    session: Session,
    config: ClientConfig,
    dispatcher: Arc<dyn NotificationDispatcher>,
    status: StatusReconciler,
}

impl ChatRepository {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        session: Session,
        config: ClientConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let status = StatusReconciler::new(store.clone());
        Self {
            store,
            session,
            config,
            dispatcher,
            status,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn me(&self) -> &UserId {
        &self.session.user_id
    }

    /// Fresh chat id from the store's key generator, or a UUID when the
    /// store is unreachable.
    pub fn get_chat_id(&self) -> ChatId {
        ChatId::from(self.fresh_key(&paths::chats_of(self.me())))
    }

    fn fresh_key(&self, parent: &str) -> String {
        let key = DbPath::parse(parent).and_then(|path| self.store.push_key(&path));
        match key {
            Ok(key) => key,
            Err(e) => {
                warn!(parent, error = %e, "push key unavailable, using random id");
                uuid::Uuid::new_v4().to_string()
            }
        }
    }

    /// Open an empty chat feed for the signed-in user. Pages are attached with
    /// [`ChatFeed::listen`]; dropping the feed releases every page.
    pub fn open_chat_feed(&self) -> (ChatFeed, ChannelStream<FeedUpdate>) {
        ChatFeed::open(self.store.clone(), self.me().clone(), &self.config)
    }

    /// Live snapshot stream of the signed-in user's copy of `chat`. Also
    /// subscribes the device to the chat's push topic.
    pub fn listen_for_messages(&self, chat: &ChatId) -> Result<ChannelStream<Resource<Vec<Message>>>> {
        let stream =
            listeners::listen_for_messages(self.store.clone(), chat, self.me(), &self.config)?;
        self.subscribe_for_notification(chat);
        Ok(stream)
    }

    /// Write a message to both participants and advance it to SENT once the
    /// write is confirmed. Returns the message as written.
    pub async fn send_message(&self, outgoing: OutgoingMessage) -> Result<Message> {
        let message_id = MessageId::from(self.fresh_key(&paths::messages_root()));
        let now = chrono::Utc::now().timestamp_millis();
        let plan = match plan_send(&self.session, message_id, &outgoing, now) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(chat = %outgoing.chat_id, error = %e, "message not sent");
                return Err(e);
            }
        };

        let chat = &outgoing.chat_id;
        if let Err(e) = self.store.update(plan.update).await {
            error!(chat = %chat, message = %plan.message.id, error = %e, "Failed to send message");
            return Err(e.into());
        }
        info!(chat = %chat, message = %plan.message.id, "message written");

        let mut message = plan.message;
        let participants = [self.me().clone(), outgoing.other_user_id.clone()];
        match self
            .status
            .advance(chat, &participants, std::slice::from_ref(&message.id), MessageStatus::Sent)
            .await
        {
            Ok(_) => message.status = MessageStatus::Sent,
            Err(e) => warn!(chat = %chat, message = %message.id, error = %e, "SENT patch failed"),
        }

        self.post_notification_to_user(chat, &message.sender_name, message.text.as_deref().unwrap_or_default());
        Ok(message)
    }

    /// Delete the signed-in user's summary and message copies of `chats` in
    /// one atomic write. The counterpart's copies are kept.
    pub async fn delete_chat(&self, chats: &[Chat]) -> Result<()> {
        if chats.is_empty() {
            return Ok(());
        }
        let update = plan_delete(self.me(), chats);
        match self.store.update(update).await {
            Ok(()) => {
                info!(count = chats.len(), "chats deleted");
                Ok(())
            }
            Err(e) => {
                error!(count = chats.len(), error = %e, "Failed to delete chats");
                Err(e.into())
            }
        }
    }

    /// First chat both users are members of. The two reads are not atomic:
    /// a chat created between them is missed.
    pub async fn has_chat(&self, other: &UserId) -> Result<Option<ChatId>> {
        let mine = self
            .store
            .get(&Query::at(DbPath::parse(&paths::memberships_of(self.me()))?))
            .await?;
        let theirs = self
            .store
            .get(&Query::at(DbPath::parse(&paths::memberships_of(other))?))
            .await?;

        let common = mine
            .keys()
            .find(|key| theirs.child(key).exists())
            .map(ChatId::from);
        debug!(other = %other, found = common.is_some(), "membership lookup");
        Ok(common)
    }

    /// Mark incoming messages of `chat` as READ in both copies.
    pub async fn mark_chat_read(&self, chat: &ChatId) -> Result<usize> {
        self.status.mark_read(chat, self.me()).await
    }

    /// Subscribe this device to the chat's push topic. Fire-and-forget.
    pub fn subscribe_for_notification(&self, chat: &ChatId) {
        let topic = self.config.notification_topic(chat.as_str());
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            match dispatcher.subscribe_topic(&topic).await {
                Ok(()) => debug!(topic = %topic, "Subscribed to topic"),
                Err(e) => warn!(topic = %topic, error = %e, "Failed to subscribe to topic"),
            }
        });
    }

    /// Post a push to everyone subscribed to the chat's topic. Fire-and-forget.
    pub fn post_notification_to_user(&self, chat: &ChatId, sender_name: &str, text: &str) {
        let notification = PushNotification {
            topic: self.config.notification_topic(chat.as_str()),
            title: sender_name.to_string(),
            body: text.to_string(),
            data: BTreeMap::from([
                ("userId".to_string(), self.me().to_string()),
                ("chatId".to_string(), chat.to_string()),
                ("chatTitle".to_string(), sender_name.to_string()),
            ]),
        };
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let topic = notification.topic.clone();
            if let Err(e) = dispatcher.post(notification).await {
                error!(topic = %topic, error = %e, "Failed to send notification");
            }
        });
    }
}
