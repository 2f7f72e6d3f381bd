use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::event::Listener;
use crate::path::DbPath;
use crate::query::Query;
use crate::snapshot::DataSnapshot;
use crate::update::MultiPathUpdate;

/// Decision of a transaction handler given the current value of its node.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// Replace the node with this value (`null` deletes).
    Commit(Value),
    /// Leave the node untouched.
    Abort,
}

/// Handler run by [`RemoteStore::transaction`]. May run more than once on a
/// backend that retries on contention, so it must not have side effects.
pub type TransactionHandler<'a> = &'a (dyn Fn(&Value) -> TransactionOutcome + Send + Sync);

/// A hierarchical realtime database.
///
/// Every async method is a suspension point that resolves when the backend
/// acknowledges the operation. Subscriptions stay attached until the returned
/// [`Listener`] is dropped.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fresh child key under `parent`. Fails when the backend is unreachable.
    fn push_key(&self, parent: &DbPath) -> Result<String>;

    /// One-shot read of a node or a query window.
    async fn get(&self, query: &Query) -> Result<DataSnapshot>;

    /// Apply every entry of `update` atomically.
    async fn update(&self, update: MultiPathUpdate) -> Result<()>;

    /// Compare-and-set on a single node: `apply` sees the current value
    /// (`null` when absent) and its outcome is applied with no other write in
    /// between. Returns whether a value was committed.
    async fn transaction(&self, path: &DbPath, apply: TransactionHandler<'_>) -> Result<bool>;

    /// Overwrite a single node.
    async fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        let mut update = MultiPathUpdate::new();
        update.set(path.to_string(), value);
        self.update(update).await
    }

    /// Child-incremental subscription. Starts with one `ChildAdded` per child
    /// already in the window.
    fn listen_children(&self, query: Query) -> Result<Listener>;

    /// Whole-value subscription. Starts with the current snapshot.
    fn listen_value(&self, query: Query) -> Result<Listener>;
}
