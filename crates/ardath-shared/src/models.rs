//! Domain records stored in the realtime tree.
//!
//! Every record is a camelCase JSON object. Records carry their own key as
//! `id`, but older writers omitted it, so decoding always falls back to the
//! key the record was found under.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::USER_STATUS_OFFLINE;
use crate::error::ModelError;
use crate::types::{ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record that lives under its own key in the realtime tree.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Key the record is stored under (its identity).
    fn key(&self) -> &str;

    /// Fill the identity from the storage key when the payload lacks one.
    fn with_key(self, key: &str) -> Self;

    /// Decode a record found at `key`.
    fn decode(key: &str, value: &Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::NotAnObject(key.to_string()));
        }
        let record: Self = serde_json::from_value(value.clone())?;
        Ok(record.with_key(key))
    }

    /// Encode the record into a tree value.
    fn encode(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }
}

// ---------------------------------------------------------------------------
// MessageStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a message. Ordered: `Pending < Sent < Read`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    #[default]
    Pending,
    Sent,
    Read,
}

impl MessageStatus {
    /// Merge rule applied at every write site: the higher-ranked status wins.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns `Some(target)` only when moving to `target` is an upgrade.
    pub fn advance_to(self, target: Self) -> Option<Self> {
        (target > self).then_some(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Read => "READ",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Per-owner summary of a conversation, stored at `chats/{owner}/{chatId}`.
///
/// Each participant holds its own copy where `user_id` names the counterpart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(default)]
    pub id: ChatId,
    /// The counterpart of the owner of this copy.
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_message: String,
    /// Wall-clock millis of the last message.
    #[serde(default)]
    pub timestamp: i64,
}

impl Record for Chat {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn with_key(mut self, key: &str) -> Self {
        if self.id.is_empty() {
            self.id = ChatId::from(key);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message, stored once per participant at
/// `messages/{chatId}/{participantId}/{messageId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: MessageId,
    #[serde(default)]
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_image: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Wall-clock millis at send time.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }
}

impl Record for Message {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn with_key(mut self, key: &str) -> Self {
        if self.id.is_empty() {
            self.id = MessageId::from(key);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Public profile stored at `users/{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    /// Meant to be unique; checked before write, never enforced atomically.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default = "default_user_status")]
    pub status: String,
    /// Wall-clock millis of the last presence update.
    #[serde(default)]
    pub last_seen: i64,
}

fn default_user_status() -> String {
    USER_STATUS_OFFLINE.to_string()
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: UserId::default(),
            name: String::new(),
            username: String::new(),
            email: String::new(),
            bio: String::new(),
            photo_url: None,
            status: default_user_status(),
            last_seen: 0,
        }
    }
}

impl User {
    /// Copy with surrounding whitespace removed from every free-text field.
    pub fn trimmed(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            bio: self.bio.trim().to_string(),
            photo_url: self
                .photo_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            status: self.status.trim().to_string(),
            last_seen: self.last_seen,
        }
    }
}

impl Record for User {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn with_key(mut self, key: &str) -> Self {
        if self.id.is_empty() {
            self.id = UserId::from(key);
        }
        self
    }
}

/// Builder for profile edits. Fields not touched keep the original values.
#[derive(Debug, Clone)]
pub struct UpdateProfileRequest {
    user: User,
}

impl UpdateProfileRequest {
    pub fn new(user: &User) -> Self {
        Self { user: user.clone() }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.user.name = name.into();
        self
    }

    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.user.bio = bio.into();
        self
    }

    pub fn photo_url(mut self, url: impl Into<String>) -> Self {
        self.user.photo_url = Some(url.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.user.status = status.into();
        self
    }

    pub fn last_seen(mut self, millis: i64) -> Self {
        self.user.last_seen = millis;
        self
    }

    pub fn build(self) -> User {
        self.user.trimmed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_order_and_merge() {
        assert!(MessageStatus::Pending < MessageStatus::Sent);
        assert!(MessageStatus::Sent < MessageStatus::Read);
        assert_eq!(
            MessageStatus::Read.merge(MessageStatus::Sent),
            MessageStatus::Read
        );
        assert_eq!(MessageStatus::Read.advance_to(MessageStatus::Sent), None);
        assert_eq!(
            MessageStatus::Pending.advance_to(MessageStatus::Sent),
            Some(MessageStatus::Sent)
        );
        assert_eq!(MessageStatus::Sent.advance_to(MessageStatus::Sent), None);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(MessageStatus::Pending).unwrap(),
            json!("PENDING")
        );
        let s: MessageStatus = serde_json::from_value(json!("READ")).unwrap();
        assert_eq!(s, MessageStatus::Read);
    }

    #[test]
    fn message_decode_fills_id_from_key() {
        let value = json!({
            "senderId": "u1",
            "senderName": "Alice",
            "text": "hi",
            "timestamp": 10,
            "status": "SENT"
        });
        let msg = Message::decode("m1", &value).unwrap();
        assert_eq!(msg.id.as_str(), "m1");
        assert_eq!(msg.sender_id.as_str(), "u1");
        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(msg.image_url.is_none());
    }

    #[test]
    fn message_without_status_is_pending() {
        let msg = Message::decode("m1", &json!({ "senderId": "u1" })).unwrap();
        assert_eq!(msg.status, MessageStatus::Pending);
    }

    #[test]
    fn chat_encodes_camel_case() {
        let chat = Chat {
            id: "c1".into(),
            user_id: "u2".into(),
            title: "B".into(),
            last_message: "hi".into(),
            timestamp: 5,
        };
        let v = chat.encode().unwrap();
        assert_eq!(v["userId"], "u2");
        assert_eq!(v["lastMessage"], "hi");
    }

    #[test]
    fn scalar_is_not_a_record() {
        assert!(matches!(
            Chat::decode("c1", &json!(true)),
            Err(ModelError::NotAnObject(_))
        ));
    }

    #[test]
    fn update_profile_trims() {
        let user = User {
            id: "u1".into(),
            name: "Old".into(),
            ..Default::default()
        };
        let updated = UpdateProfileRequest::new(&user)
            .name("  New Name ")
            .bio(" hello ")
            .photo_url("   ")
            .build();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.bio, "hello");
        assert_eq!(updated.photo_url, None);
        assert_eq!(updated.status, "offline");
    }
}
