//! Adapters from raw store subscriptions to typed result channels.
//!
//! Each adapter runs as a task that owns its backend [`Listener`]; aborting the
//! task drops the listener, which detaches it from the store.
//!
//! [`Listener`]: ardath_store::Listener

pub mod chats;
pub mod messages;

use ardath_shared::models::Record;
use ardath_store::{DataSnapshot, RemoteEvent};
use tracing::warn;

use crate::reducer::Delta;

pub use chats::{ChatFeed, FeedUpdate};
pub use messages::listen_for_messages;

/// Map one child-level event to a typed delta. Records that fail to decode
/// are skipped; value and cancellation events yield `None`.
pub(crate) fn to_delta<T: Record>(event: RemoteEvent) -> Option<Delta<T>> {
    match event {
        RemoteEvent::ChildAdded { key, value } => decode(&key, &value).map(Delta::Added),
        RemoteEvent::ChildChanged { key, value } => decode(&key, &value).map(Delta::Changed),
        RemoteEvent::ChildRemoved { key, .. } => Some(Delta::Removed(key)),
        RemoteEvent::Value(_) | RemoteEvent::Cancelled(_) => None,
    }
}

/// Decode every child of `snapshot`, in snapshot order.
pub(crate) fn decode_children<T: Record>(snapshot: &DataSnapshot) -> Vec<T> {
    snapshot
        .children()
        .filter_map(|(key, value)| decode(key, value))
        .collect()
}

fn decode<T: Record>(key: &str, value: &serde_json::Value) -> Option<T> {
    match T::decode(key, value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(key, error = %e, "skipping undecodable record");
            None
        }
    }
}
