//! Canonical in-memory collections built from listener deltas.
//!
//! A reducer is owned by exactly one task and mutated only from that task's
//! event loop. Order is arrival order: an add appends, a change replaces in
//! place, a remove deletes by id. Consumers that need time order re-sort.

use ardath_shared::models::{Message, MessageStatus, Record};
use ardath_shared::{MessageId, UserId};

/// Typed change derived from one child-level backend event.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta<T> {
    Added(T),
    Changed(T),
    Removed(String),
}

impl<T: Record> Delta<T> {
    pub fn key(&self) -> &str {
        match self {
            Delta::Added(item) | Delta::Changed(item) => item.key(),
            Delta::Removed(key) => key.as_str(),
        }
    }
}

/// Ordered list with at most one entry per key.
#[derive(Debug, Clone)]
pub struct KeyedList<T> {
    items: Vec<T>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delta. Returns `false` when it was a no-op: a change or a
    /// removal for a key that is not tracked.
    pub fn apply(&mut self, delta: Delta<T>) -> bool {
        match delta {
            Delta::Added(item) => {
                match self.position(item.key()) {
                    Some(i) => self.items[i] = item,
                    None => self.items.push(item),
                }
                true
            }
            Delta::Changed(item) => match self.position(item.key()) {
                Some(i) => {
                    self.items[i] = item;
                    true
                }
                None => false,
            },
            Delta::Removed(key) => match self.position(&key) {
                Some(i) => {
                    self.items.remove(i);
                    true
                }
                None => false,
            },
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn last_key(&self) -> Option<&str> {
        self.items.last().map(Record::key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }
}

/// One participant's copy of a thread, rebuilt from every value snapshot.
///
/// Rebuilding merges each message's status with the previous observation of
/// the same id, so an observed status never goes backwards.
#[derive(Debug, Clone, Default)]
pub struct MessageThread {
    messages: Vec<Message>,
}

impl MessageThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the thread with `incoming`, keeping incoming order.
    pub fn replace(&mut self, incoming: Vec<Message>) {
        let previous = std::mem::take(&mut self.messages);
        self.messages = incoming
            .into_iter()
            .map(|mut message| {
                if let Some(old) = previous.iter().find(|m| m.id == message.id) {
                    message.status = message.status.merge(old.status);
                }
                message
            })
            .collect();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Incoming messages `reader` has not marked READ yet.
    pub fn unread_for(&self, reader: &UserId) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|m| !m.is_from(reader) && m.status < MessageStatus::Read)
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ardath_shared::models::Chat;

    fn chat(id: &str, last: &str) -> Chat {
        Chat {
            id: id.into(),
            last_message: last.into(),
            ..Default::default()
        }
    }

    fn message(id: &str, sender: &str, status: MessageStatus) -> Message {
        Message {
            id: id.into(),
            sender_id: sender.into(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn add_appends_and_change_replaces_in_place() {
        let mut list = KeyedList::new();
        assert!(list.apply(Delta::Added(chat("b", "1"))));
        assert!(list.apply(Delta::Added(chat("a", "1"))));
        assert!(list.apply(Delta::Changed(chat("b", "2"))));

        let ids: Vec<&str> = list.items().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(list.items()[0].last_message, "2");
        assert_eq!(list.last_key(), Some("a"));
    }

    #[test]
    fn duplicate_add_does_not_duplicate() {
        let mut list = KeyedList::new();
        list.apply(Delta::Added(chat("a", "1")));
        list.apply(Delta::Changed(chat("a", "2")));
        list.apply(Delta::Added(chat("a", "3")));
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].last_message, "3");
    }

    #[test]
    fn untracked_change_and_remove_are_noops() {
        let mut list = KeyedList::new();
        list.apply(Delta::Added(chat("a", "1")));
        assert!(!list.apply(Delta::Changed(chat("x", "1"))));
        assert!(!list.apply(Delta::Removed("x".into())));
        assert_eq!(list.len(), 1);

        assert!(list.apply(Delta::Removed("a".into())));
        assert!(list.is_empty());
    }

    #[test]
    fn any_delta_order_keeps_one_entry_per_id() {
        let deltas = vec![
            Delta::Changed(chat("a", "0")),
            Delta::Added(chat("a", "1")),
            Delta::Added(chat("b", "1")),
            Delta::Removed("c".into()),
            Delta::Changed(chat("b", "2")),
            Delta::Added(chat("a", "2")),
            Delta::Added(chat("c", "1")),
        ];
        let mut list = KeyedList::new();
        for delta in deltas {
            list.apply(delta);
        }
        let mut ids: Vec<&str> = list.items().iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn thread_rebuild_never_downgrades_status() {
        let mut thread = MessageThread::new();
        thread.replace(vec![message("m1", "u2", MessageStatus::Read)]);
        thread.replace(vec![
            message("m1", "u2", MessageStatus::Sent),
            message("m2", "u2", MessageStatus::Pending),
        ]);
        assert_eq!(thread.messages()[0].status, MessageStatus::Read);
        assert_eq!(thread.messages()[1].status, MessageStatus::Pending);
    }

    #[test]
    fn unread_excludes_own_and_read_messages() {
        let mut thread = MessageThread::new();
        thread.replace(vec![
            message("m1", "u1", MessageStatus::Sent),
            message("m2", "u2", MessageStatus::Sent),
            message("m3", "u2", MessageStatus::Read),
            message("m4", "u2", MessageStatus::Pending),
        ]);
        let unread = thread.unread_for(&UserId::from("u1"));
        assert_eq!(unread, vec![MessageId::from("m2"), MessageId::from("m4")]);
    }
}
