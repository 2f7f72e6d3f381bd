//! # ardath-store
//!
//! The realtime database seam used by the Ardath client.
//!
//! [`RemoteStore`] is the narrow interface the synchronization core needs from
//! a hierarchical realtime backend: key generation, one-shot reads, ordered
//! range queries, child-level and whole-value subscriptions, and atomic
//! multi-path updates. [`MemoryStore`] implements it over an in-process JSON
//! tree with the same event semantics, so the whole pipeline can run offline.

pub mod event;
pub mod keygen;
pub mod memory;
pub mod path;
pub mod query;
pub mod remote;
pub mod snapshot;
pub mod tree;
pub mod update;

mod error;

pub use error::{Result, StoreError};
pub use event::{Listener, ListenerHandle, RemoteEvent};
pub use keygen::PushKeyGenerator;
pub use memory::MemoryStore;
pub use path::DbPath;
pub use query::{OrderBy, Query};
pub use remote::{RemoteStore, TransactionHandler, TransactionOutcome};
pub use snapshot::DataSnapshot;
pub use update::MultiPathUpdate;
