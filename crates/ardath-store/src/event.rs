//! Raw change events pushed by a store subscription.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::snapshot::DataSnapshot;

/// One change notification from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    ChildAdded { key: String, value: Value },
    ChildChanged { key: String, value: Value },
    ChildRemoved { key: String, value: Value },
    /// Whole-node snapshot (value subscriptions only).
    Value(DataSnapshot),
    /// Terminal: the backend revoked the listener.
    Cancelled(StoreError),
}

/// Detaches a backend listener when dropped.
pub struct ListenerHandle {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerHandle {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// An attached subscription: its event stream plus the handle that releases it.
#[derive(Debug)]
pub struct Listener {
    events: mpsc::UnboundedReceiver<RemoteEvent>,
    _handle: ListenerHandle,
}

impl Listener {
    pub fn new(events: mpsc::UnboundedReceiver<RemoteEvent>, handle: ListenerHandle) -> Self {
        Self {
            events,
            _handle: handle,
        }
    }

    /// Next event, `None` once the backend side is gone.
    pub async fn next(&mut self) -> Option<RemoteEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn dropping_listener_detaches() {
        let detached = Arc::new(AtomicBool::new(false));
        let flag = detached.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listener = Listener::new(rx, ListenerHandle::new(move || {
            flag.store(true, Ordering::SeqCst);
        }));
        tx.send(RemoteEvent::Cancelled(StoreError::Unavailable)).unwrap();
        assert!(matches!(listener.next().await, Some(RemoteEvent::Cancelled(_))));
        assert!(!detached.load(Ordering::SeqCst));
        drop(listener);
        assert!(detached.load(Ordering::SeqCst));
    }
}
