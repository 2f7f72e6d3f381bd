//! In-process realtime tree implementing [`RemoteStore`].
//!
//! Writes are applied under a single lock and every attached listener is
//! refreshed before the lock is released, so each listener observes events
//! in write order. Child listeners diff their query window after each write:
//! a child pushed out of a limited window is reported as removed, a child
//! entering it as added.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::event::{Listener, ListenerHandle, RemoteEvent};
use crate::keygen::PushKeyGenerator;
use crate::path::DbPath;
use crate::query::Query;
use crate::remote::{RemoteStore, TransactionHandler, TransactionOutcome};
use crate::snapshot::DataSnapshot;
use crate::tree;
use crate::update::MultiPathUpdate;

/// Cheaply cloneable handle to a shared in-memory tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    keys: PushKeyGenerator,
}

#[derive(Default)]
struct State {
    root: Value,
    listeners: BTreeMap<u64, Subscription>,
    next_listener_id: u64,
    offline: bool,
    failing_writes: usize,
    writes: usize,
}

struct Subscription {
    query: Query,
    observed: Observed,
    tx: mpsc::UnboundedSender<RemoteEvent>,
}

enum Observed {
    Children(Vec<(String, Value)>),
    Value(DataSnapshot),
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose tree starts as `root`.
    pub fn with_data(root: Value) -> Self {
        let store = Self::new();
        store.inner.lock().root = tree::normalize(root);
        store
    }

    /// Current value at `path`, bypassing offline simulation.
    pub fn value_at(&self, path: &str) -> Option<Value> {
        let path = DbPath::parse(path).ok()?;
        tree::get(&self.inner.lock().root, &path).cloned()
    }

    /// Simulate loss of connectivity: reads, writes and key generation fail.
    pub fn set_offline(&self, offline: bool) {
        info!(offline, "memory store connectivity changed");
        self.inner.lock().offline = offline;
    }

    /// Reject the next `count` writes.
    pub fn fail_next_writes(&self, count: usize) {
        self.inner.lock().failing_writes = count;
    }

    /// Number of updates applied so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Revoke every listener at or below `prefix`, as the backend does on a
    /// permission change. Returns how many were cancelled.
    pub fn cancel_listeners(&self, prefix: &str, reason: &str) -> Result<usize> {
        let prefix = DbPath::parse(prefix)?;
        let mut state = self.inner.lock();
        let revoked: Vec<u64> = state
            .listeners
            .iter()
            .filter(|(_, sub)| prefix.contains(sub.query.path()))
            .map(|(id, _)| *id)
            .collect();
        for id in &revoked {
            if let Some(sub) = state.listeners.remove(id) {
                let _ = sub
                    .tx
                    .send(RemoteEvent::Cancelled(StoreError::Cancelled(reason.to_string())));
            }
        }
        info!(prefix = %prefix, count = revoked.len(), "listeners cancelled");
        Ok(revoked.len())
    }

    fn attach(&self, query: Query, observed: Observed, rx: mpsc::UnboundedReceiver<RemoteEvent>, tx: mpsc::UnboundedSender<RemoteEvent>, state: &mut State) -> Listener {
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        debug!(listener = id, path = %query.path(), "listener attached");
        state.listeners.insert(id, Subscription { query, observed, tx });

        let weak = Arc::downgrade(&self.inner);
        let handle = ListenerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.lock().listeners.remove(&id).is_some() {
                    debug!(listener = id, "listener detached");
                }
            }
        });
        Listener::new(rx, handle)
    }
}

impl State {
    fn refresh_listeners(&mut self) {
        let root = &self.root;
        self.listeners.retain(|id, sub| {
            for event in sub.refresh(root) {
                if sub.tx.send(event).is_err() {
                    debug!(listener = *id, "listener receiver gone, dropping");
                    return false;
                }
            }
            true
        });
    }
}

impl Subscription {
    fn refresh(&mut self, root: &Value) -> Vec<RemoteEvent> {
        match &mut self.observed {
            Observed::Children(previous) => {
                let current = self.query.window(root);
                let events = diff_children(previous, &current);
                *previous = current;
                events
            }
            Observed::Value(previous) => {
                let current = self.query.snapshot(root);
                if current == *previous {
                    Vec::new()
                } else {
                    *previous = current.clone();
                    vec![RemoteEvent::Value(current)]
                }
            }
        }
    }
}

fn diff_children(previous: &[(String, Value)], current: &[(String, Value)]) -> Vec<RemoteEvent> {
    let before: HashMap<&str, &Value> = previous.iter().map(|(k, v)| (k.as_str(), v)).collect();
    let after: HashMap<&str, &Value> = current.iter().map(|(k, v)| (k.as_str(), v)).collect();

    let mut events = Vec::new();
    for (key, value) in previous {
        if !after.contains_key(key.as_str()) {
            events.push(RemoteEvent::ChildRemoved {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }
    for (key, value) in current {
        match before.get(key.as_str()) {
            None => events.push(RemoteEvent::ChildAdded {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(old) if *old != value => events.push(RemoteEvent::ChildChanged {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(_) => {}
        }
    }
    events
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn push_key(&self, _parent: &DbPath) -> Result<String> {
        if self.inner.lock().offline {
            return Err(StoreError::Unavailable);
        }
        Ok(self.inner.keys.generate())
    }

    async fn get(&self, query: &Query) -> Result<DataSnapshot> {
        let state = self.inner.lock();
        if state.offline {
            return Err(StoreError::Unavailable);
        }
        Ok(query.snapshot(&state.root))
    }

    async fn update(&self, update: MultiPathUpdate) -> Result<()> {
        let mut state = self.inner.lock();
        if state.offline {
            return Err(StoreError::Unavailable);
        }
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(StoreError::WriteFailed("rejected by backend".to_string()));
        }
        let entries = update.resolve()?;
        if entries.is_empty() {
            return Ok(());
        }
        let count = entries.len();
        for (path, value) in entries {
            tree::set(&mut state.root, &path, value);
        }
        state.writes += 1;
        state.refresh_listeners();
        debug!(paths = count, "update applied");
        Ok(())
    }

    async fn transaction(&self, path: &DbPath, apply: TransactionHandler<'_>) -> Result<bool> {
        let mut state = self.inner.lock();
        if state.offline {
            return Err(StoreError::Unavailable);
        }
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(StoreError::WriteFailed("rejected by backend".to_string()));
        }
        let current = tree::get(&state.root, path).cloned().unwrap_or(Value::Null);
        match apply(&current) {
            TransactionOutcome::Abort => Ok(false),
            TransactionOutcome::Commit(value) => {
                tree::set(&mut state.root, path, value);
                state.writes += 1;
                state.refresh_listeners();
                debug!(path = %path, "transaction committed");
                Ok(true)
            }
        }
    }

    fn listen_children(&self, query: Query) -> Result<Listener> {
        let mut state = self.inner.lock();
        let window = query.window(&state.root);
        let (tx, rx) = mpsc::unbounded_channel();
        for (key, value) in &window {
            let _ = tx.send(RemoteEvent::ChildAdded {
                key: key.clone(),
                value: value.clone(),
            });
        }
        Ok(self.attach(query, Observed::Children(window), rx, tx, &mut state))
    }

    fn listen_value(&self, query: Query) -> Result<Listener> {
        let mut state = self.inner.lock();
        let snapshot = query.snapshot(&state.root);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(RemoteEvent::Value(snapshot.clone()));
        Ok(self.attach(query, Observed::Value(snapshot), rx, tx, &mut state))
    }
}
