//! # ardath-client
//!
//! Chat and message synchronization core of the Ardath messenger.
//!
//! The crate keeps a signed-in user's chat list and open thread consistent
//! with a hierarchical realtime store ([`ardath_store::RemoteStore`]):
//!
//! - [`repository`] performs the atomic fan-out writes for sending and
//!   deleting, the shared-chat lookup, and profile reads and edits.
//! - [`listeners`] turn store subscriptions into ordered streams of
//!   [`resource::Resource`] values, one reducer task per feed.
//! - [`status`] moves message status forward only, on every participant's
//!   copy that still exists.
//! - [`view_model`] exposes observable state over `tokio::sync::watch`
//!   with paging guards, selection, debounced username checks and teardown.
//!
//! Platform concerns (notifications, toasts, push delivery) are injected
//! through the traits in [`platform`].

pub mod config;
pub mod error;
pub mod fanout;
pub mod listeners;
pub mod pagination;
pub mod platform;
pub mod reducer;
pub mod repository;
pub mod resource;
pub mod session;
pub mod state;
pub mod status;
pub mod timeline;
pub mod view_model;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::{ClientConfig, ReadPolicy};
pub use error::{ClientError, Result};
pub use fanout::OutgoingMessage;
pub use platform::{
    ActiveChat, LocalNotification, LoggingDispatcher, NoopPlatform, NotificationDispatcher,
    PlatformServices, PushHandler, PushNotification,
};
pub use repository::{ChatRepository, UserRepository};
pub use resource::{ChannelStream, Resource};
pub use session::Session;
pub use view_model::{ChatViewModel, UserViewModel};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ardath_client=debug,ardath_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Ardath client tracing initialized");
    }
}
