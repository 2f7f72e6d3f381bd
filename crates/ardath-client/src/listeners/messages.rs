//! Whole-thread message listener.

use std::sync::Arc;

use ardath_shared::models::Message;
use ardath_shared::{paths, ChatId, UserId};
use ardath_store::{DbPath, Listener, Query, RemoteEvent, RemoteStore};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ReadPolicy};
use crate::error::Result;
use crate::reducer::MessageThread;
use crate::resource::{ChannelStream, Resource};
use crate::status::StatusReconciler;

use super::decode_children;

struct ThreadContext {
    chat: ChatId,
    reader: UserId,
    error_text: String,
    /// Present when incoming messages are marked READ on every snapshot.
    auto_read: Option<StatusReconciler>,
}

/// Subscribe to `reader`'s copy of `chat`. Every snapshot rebuilds the whole
/// list; a backend cancellation emits the configured user-facing error and
/// ends the stream.
pub fn listen_for_messages(
    store: Arc<dyn RemoteStore>,
    chat: &ChatId,
    reader: &UserId,
    config: &ClientConfig,
) -> Result<ChannelStream<Resource<Vec<Message>>>> {
    let path = DbPath::parse(&paths::thread(chat, reader))?;
    let listener = store.listen_value(Query::at(path))?;
    let auto_read = match config.read_policy {
        ReadPolicy::OnSnapshot => Some(StatusReconciler::new(store)),
        ReadPolicy::Foreground => None,
    };
    let ctx = ThreadContext {
        chat: chat.clone(),
        reader: reader.clone(),
        error_text: config.listen_messages_error.clone(),
        auto_read,
    };

    info!(chat = %chat, reader = %reader, "message listener attached");
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let producer = tokio::spawn(run_thread(ctx, listener, tx));
    Ok(ChannelStream::with_producer(rx, producer))
}

async fn run_thread(
    ctx: ThreadContext,
    mut listener: Listener,
    tx: mpsc::Sender<Resource<Vec<Message>>>,
) {
    let mut thread = MessageThread::new();
    while let Some(event) = listener.next().await {
        match event {
            RemoteEvent::Value(snapshot) => {
                thread.replace(decode_children(&snapshot));
                if let Some(reconciler) = &ctx.auto_read {
                    if !thread.unread_for(&ctx.reader).is_empty() {
                        spawn_mark_read(reconciler.clone(), ctx.chat.clone(), ctx.reader.clone());
                    }
                }
                if tx
                    .send(Resource::Success(thread.messages().to_vec()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            RemoteEvent::Cancelled(e) => {
                warn!(chat = %ctx.chat, error = %e, "message listener cancelled");
                let _ = tx.send(Resource::Error(ctx.error_text.clone())).await;
                break;
            }
            _ => {}
        }
    }
    debug!(chat = %ctx.chat, "message listener finished");
}

/// Best-effort: failures are logged and never retried.
fn spawn_mark_read(reconciler: StatusReconciler, chat: ChatId, reader: UserId) {
    tokio::spawn(async move {
        match reconciler.mark_read(&chat, &reader).await {
            Ok(count) => debug!(chat = %chat, count, "incoming messages marked read"),
            Err(e) => debug!(chat = %chat, error = %e, "mark read failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ardath_shared::models::MessageStatus;
    use ardath_store::MemoryStore;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    async fn next(stream: &mut ChannelStream<Resource<Vec<Message>>>) -> Resource<Vec<Message>> {
        tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out")
            .expect("stream closed")
    }

    fn thread_store() -> MemoryStore {
        MemoryStore::with_data(json!({ "messages": { "c1": {
            "u1": {
                "m1": { "senderId": "u2", "text": "hey", "timestamp": 1, "status": "SENT" }
            },
            "u2": {
                "m1": { "senderId": "u2", "text": "hey", "timestamp": 1, "status": "SENT" }
            }
        }}}))
    }

    #[tokio::test]
    async fn snapshots_rebuild_the_list() {
        let store = thread_store();
        let mut stream = listen_for_messages(
            Arc::new(store.clone()),
            &ChatId::from("c1"),
            &UserId::from("u1"),
            &ClientConfig::default(),
        )
        .unwrap();

        let first = next(&mut stream).await;
        assert_eq!(first.data().map(Vec::len), Some(1));

        store
            .set(
                &DbPath::parse("messages/c1/u1/m2").unwrap(),
                json!({ "senderId": "u1", "text": "yo", "timestamp": 2 }),
            )
            .await
            .unwrap();
        let second = next(&mut stream).await;
        let texts: Vec<_> = second
            .data()
            .unwrap()
            .iter()
            .map(|m| m.text.clone().unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["hey", "yo"]);
        assert_eq!(store.value_at("messages/c1/u1/m1/status"), Some(json!("SENT")));
    }

    #[tokio::test]
    async fn snapshot_policy_marks_incoming_read() {
        let store = thread_store();
        let config = ClientConfig {
            read_policy: ReadPolicy::OnSnapshot,
            ..ClientConfig::default()
        };
        let mut stream = listen_for_messages(
            Arc::new(store.clone()),
            &ChatId::from("c1"),
            &UserId::from("u1"),
            &config,
        )
        .unwrap();

        next(&mut stream).await;
        let marked = next(&mut stream).await;
        assert_eq!(marked.data().unwrap()[0].status, MessageStatus::Read);
        assert_eq!(store.value_at("messages/c1/u2/m1/status"), Some(json!("READ")));
    }

    #[tokio::test]
    async fn cancellation_emits_user_facing_error() {
        let store = thread_store();
        let mut stream = listen_for_messages(
            Arc::new(store.clone()),
            &ChatId::from("c1"),
            &UserId::from("u1"),
            &ClientConfig::default(),
        )
        .unwrap();
        next(&mut stream).await;

        store.cancel_listeners("messages/c1", "revoked").unwrap();
        assert_eq!(
            next(&mut stream).await,
            Resource::Error(ClientConfig::default().listen_messages_error)
        );
        let ended = tokio::time::timeout(Duration::from_secs(1), stream.next()).await;
        assert!(matches!(ended, Ok(None)));
    }
}
