//! Monotonic status transitions across message copies.
//!
//! Every status write goes through [`StatusReconciler::advance`], which runs
//! one store transaction per message copy. The merge rule is evaluated
//! against the value the store holds at commit time, so a READ copy stays
//! READ when a late SENT confirmation races with it, and a deleted copy is
//! never resurrected by a status patch. Copies are patched independently:
//! one participant's copy can be upgraded while the other's write fails.

use std::sync::Arc;

use ardath_shared::models::MessageStatus;
use ardath_shared::{paths, ChatId, MessageId, UserId};
use ardath_store::{DbPath, Query, RemoteStore, TransactionOutcome};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;

#[derive(Clone)]
pub struct StatusReconciler {
    store: Arc<dyn RemoteStore>,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Move `messages` to `target` in each participant copy of `chat`.
    /// Returns the number of copies upgraded.
    pub async fn advance(
        &self,
        chat: &ChatId,
        participants: &[UserId],
        messages: &[MessageId],
        target: MessageStatus,
    ) -> Result<usize> {
        let upgrade = move |current: &Value| match upgraded(current, target) {
            Some(value) => TransactionOutcome::Commit(value),
            None => TransactionOutcome::Abort,
        };

        let mut count = 0;
        for participant in participants {
            for message in messages {
                let path = DbPath::parse(&paths::message(chat, participant, message))?;
                if self.store.transaction(&path, &upgrade).await? {
                    count += 1;
                } else {
                    trace!(chat = %chat, participant = %participant, message = %message, "copy gone or already ahead");
                }
            }
        }
        if count > 0 {
            debug!(chat = %chat, status = %target, count, "message status advanced");
        }
        Ok(count)
    }

    /// Mark every message in `reader`'s copy of `chat` that was authored by
    /// someone else as READ, in both the reader's and the author's copy.
    pub async fn mark_read(&self, chat: &ChatId, reader: &UserId) -> Result<usize> {
        let thread = DbPath::parse(&paths::thread(chat, reader))?;
        let snapshot = self.store.get(&Query::at(thread)).await?;

        let mut participants = vec![reader.clone()];
        let mut unread = Vec::new();
        for (key, value) in snapshot.children() {
            let sender = value
                .get("senderId")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if sender.is_empty() || sender == reader.as_str() {
                continue;
            }
            let status: MessageStatus = value
                .get(paths::STATUS_FIELD)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            if status < MessageStatus::Read {
                unread.push(MessageId::from(key));
                let sender = UserId::from(sender);
                if !participants.contains(&sender) {
                    participants.push(sender);
                }
            }
        }

        if unread.is_empty() {
            return Ok(0);
        }
        self.advance(chat, &participants, &unread, MessageStatus::Read)
            .await
    }
}

/// The copy with its status moved to `target`, or `None` when the copy is
/// gone or already at or past `target`.
fn upgraded(copy: &Value, target: MessageStatus) -> Option<Value> {
    let Value::Object(fields) = copy else {
        return None;
    };
    let current: MessageStatus = fields
        .get(paths::STATUS_FIELD)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let next = current.advance_to(target)?;
    let mut fields = fields.clone();
    fields.insert(
        paths::STATUS_FIELD.to_string(),
        Value::String(next.as_str().to_string()),
    );
    Some(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ardath_store::MemoryStore;
    use serde_json::json;

    fn store_with_thread() -> MemoryStore {
        MemoryStore::with_data(json!({
            "messages": { "c1": {
                "u1": {
                    "m1": { "senderId": "u1", "status": "READ" },
                    "m2": { "senderId": "u2", "status": "SENT" }
                },
                "u2": {
                    "m1": { "senderId": "u1", "status": "SENT" },
                    "m2": { "senderId": "u2", "status": "SENT" }
                }
            }}
        }))
    }

    fn ids(raw: &[&str]) -> Vec<MessageId> {
        raw.iter().map(|s| MessageId::from(*s)).collect()
    }

    #[tokio::test]
    async fn never_downgrades() {
        let store = store_with_thread();
        let reconciler = StatusReconciler::new(Arc::new(store.clone()));
        let written = reconciler
            .advance(
                &ChatId::from("c1"),
                &[UserId::from("u1"), UserId::from("u2")],
                &ids(&["m1"]),
                MessageStatus::Sent,
            )
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(store.value_at("messages/c1/u1/m1/status"), Some(json!("READ")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn skips_deleted_copies() {
        let store = store_with_thread();
        let reconciler = StatusReconciler::new(Arc::new(store.clone()));
        let written = reconciler
            .advance(
                &ChatId::from("c1"),
                &[UserId::from("u1"), UserId::from("u3")],
                &ids(&["m2", "m9"]),
                MessageStatus::Read,
            )
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert!(store.value_at("messages/c1/u3").is_none());
        assert!(store.value_at("messages/c1/u1/m9").is_none());
    }

    #[tokio::test]
    async fn mark_read_patches_both_copies_of_incoming() {
        let store = store_with_thread();
        let reconciler = StatusReconciler::new(Arc::new(store.clone()));
        let written = reconciler.mark_read(&ChatId::from("c1"), &UserId::from("u1")).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.value_at("messages/c1/u1/m2/status"), Some(json!("READ")));
        assert_eq!(store.value_at("messages/c1/u2/m2/status"), Some(json!("READ")));
        assert_eq!(store.value_at("messages/c1/u2/m1/status"), Some(json!("SENT")));

        let again = reconciler.mark_read(&ChatId::from("c1"), &UserId::from("u1")).await.unwrap();
        assert_eq!(again, 0);
    }
}
