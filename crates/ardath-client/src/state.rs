//! Observable view state published by the view models.
//!
//! Each struct is held in a `tokio::sync::watch` channel; the UI only reads
//! it. All mutation goes through view model operations.

use ardath_shared::models::{Chat, Message, User};
use ardath_shared::ChatId;

use crate::timeline::TimelineItem;

/// Chat list screen state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Accumulated chats of every loaded page, in arrival order.
    pub chats: Vec<Chat>,

    /// Whether a page load is in flight.
    pub is_loading: bool,

    /// User-facing error of the last failed load or cancelled subscription.
    pub error: Option<String>,

    /// Chat the user opened (or is about to create).
    pub selected_chat_id: Option<ChatId>,

    /// The last page came back empty: there is nothing more to load.
    pub end_reached: bool,
}

/// Open thread state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageState {
    pub messages: Vec<Message>,

    /// `messages` grouped under day headers.
    pub items: Vec<TimelineItem>,

    pub is_loading: bool,
    pub error: Option<String>,
}

/// Profiles state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    /// Users listing (never contains the signed-in user).
    pub users: Vec<User>,

    /// Profile being viewed.
    pub user: Option<User>,

    /// The signed-in user's own profile.
    pub current_user: Option<User>,

    pub is_loading: bool,

    /// A profile edit is being written.
    pub is_updating: bool,

    pub error: Option<String>,
}

/// Username editor state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsernameState {
    /// An availability check is pending (debouncing or querying).
    pub is_checking: bool,

    /// A username change is being written.
    pub is_loading: bool,

    pub is_username_taken: bool,
    pub error: Option<String>,
}
