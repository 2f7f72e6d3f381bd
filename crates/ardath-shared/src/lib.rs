//! # ardath-shared
//!
//! Domain models, typed identifiers and the realtime-tree path contract shared
//! by the Ardath store and client crates. Nothing in here performs I/O.

pub mod constants;
pub mod error;
pub mod models;
pub mod paths;
pub mod types;

pub use error::ModelError;
pub use models::*;
pub use types::{ChatId, MessageId, UserId};
