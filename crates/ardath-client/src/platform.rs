//! Seams to the host platform: on-device notifications, toasts, and the push
//! delivery service.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ardath_shared::{ChatId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A notification to show on this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    /// Notifications with the same id replace each other.
    pub id: u64,
    pub title: String,
    pub body: String,
    pub chat_id: Option<ChatId>,
}

/// Host UI services the core needs. Injected, never reached through a global.
pub trait PlatformServices: Send + Sync {
    fn show_notification(&self, notification: LocalNotification);
    fn show_toast(&self, message: &str);
}

/// Platform that only logs. Useful headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlatform;

impl PlatformServices for NoopPlatform {
    fn show_notification(&self, notification: LocalNotification) {
        debug!(id = notification.id, title = %notification.title, "notification suppressed (noop platform)");
    }

    fn show_toast(&self, message: &str) {
        debug!(message, "toast suppressed (noop platform)");
    }
}

/// Push message sent to a topic, as handed to the delivery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    pub topic: String,
    pub title: String,
    pub body: String,
    /// Routing data: `userId` (the sender), `chatId`, `chatTitle`.
    pub data: BTreeMap<String, String>,
}

impl PushNotification {
    pub fn sender(&self) -> Option<&str> {
        self.data.get("userId").map(String::as_str)
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.data.get("chatId").map(String::as_str)
    }
}

/// Out-of-band push delivery. Every failure is logged by the caller and
/// otherwise ignored.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn subscribe_topic(&self, topic: &str) -> anyhow::Result<()>;
    async fn post(&self, notification: PushNotification) -> anyhow::Result<()>;
}

/// Dispatcher that logs instead of delivering.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn subscribe_topic(&self, topic: &str) -> anyhow::Result<()> {
        info!(topic, "subscribed to topic");
        Ok(())
    }

    async fn post(&self, notification: PushNotification) -> anyhow::Result<()> {
        info!(topic = %notification.topic, title = %notification.title, "push notification posted");
        Ok(())
    }
}

/// The chat currently on screen, if any.
#[derive(Debug, Clone, Default)]
pub struct ActiveChat {
    current: Arc<Mutex<Option<ChatId>>>,
}

impl ActiveChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, chat: ChatId) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(chat);
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn get(&self) -> Option<ChatId> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is(&self, chat: &str) -> bool {
        self.get().map_or(false, |current| current.as_str() == chat)
    }
}

/// Turns received pushes into local notifications.
pub struct PushHandler {
    me: UserId,
    active: ActiveChat,
    platform: Arc<dyn PlatformServices>,
}

impl PushHandler {
    pub fn new(me: UserId, active: ActiveChat, platform: Arc<dyn PlatformServices>) -> Self {
        Self {
            me,
            active,
            platform,
        }
    }

    /// Show `push` unless it is our own message or its chat is on screen.
    /// Returns whether a notification was shown.
    pub fn handle(&self, push: &PushNotification) -> bool {
        let Some(sender) = push.sender() else {
            return false;
        };
        if sender == self.me.as_str() {
            return false;
        }
        if push.chat_id().map_or(false, |chat| self.active.is(chat)) {
            debug!(sender, "chat on screen, push not shown");
            return false;
        }

        self.platform.show_notification(LocalNotification {
            id: notification_id(sender),
            title: push.title.clone(),
            body: push.body.clone(),
            chat_id: push.chat_id().map(ChatId::from),
        });
        true
    }
}

/// 64-bit FNV-1a of the sender id, stable across processes and releases.
fn notification_id(sender: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    sender
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        shown: Mutex<Vec<LocalNotification>>,
    }

    impl PlatformServices for Recorder {
        fn show_notification(&self, notification: LocalNotification) {
            self.shown.lock().unwrap().push(notification);
        }

        fn show_toast(&self, _message: &str) {}
    }

    fn push(sender: &str, chat: &str) -> PushNotification {
        PushNotification {
            topic: format!("chat_{chat}"),
            title: "Alice".into(),
            body: "hi".into(),
            data: BTreeMap::from([
                ("userId".to_string(), sender.to_string()),
                ("chatId".to_string(), chat.to_string()),
                ("chatTitle".to_string(), "Alice".to_string()),
            ]),
        }
    }

    #[test]
    fn shows_pushes_from_others_for_background_chats() {
        let recorder = Arc::new(Recorder::default());
        let active = ActiveChat::new();
        let handler = PushHandler::new("u2".into(), active.clone(), recorder.clone());

        assert!(!handler.handle(&push("u2", "c1")));
        assert!(handler.handle(&push("u1", "c1")));

        active.set("c1".into());
        assert!(!handler.handle(&push("u1", "c1")));
        assert!(handler.handle(&push("u1", "c2")));

        let shown = recorder.shown.lock().unwrap();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].id, shown[1].id);
        assert_eq!(shown[0].id, notification_id("u1"));
        assert_eq!(shown[1].chat_id, Some(ChatId::from("c2")));
    }

    #[test]
    fn notification_id_is_fixed_per_sender() {
        assert_eq!(notification_id(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(notification_id("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(notification_id("u1"), 0x08c4_7b07_b567_47f3);
        assert_ne!(notification_id("u1"), notification_id("u2"));
    }

    #[test]
    fn push_serializes_camel_case() {
        let value = serde_json::to_value(push("u1", "c1")).unwrap();
        assert_eq!(value["topic"], "chat_c1");
        assert_eq!(value["data"]["chatId"], "c1");
    }
}
