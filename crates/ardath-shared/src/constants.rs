/// Chats fetched per page when the caller passes a non-positive size
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound of the one-shot users listing
pub const DEFAULT_USER_PAGE_SIZE: usize = 20;

/// Capacity of the bounded delta queue between an adapter and its reducer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Quiet period before a username availability check hits the backend
pub const USERNAME_DEBOUNCE_MS: u64 = 100;

/// Push topics are `chat_<chatId>`
pub const NOTIFICATION_TOPIC_PREFIX: &str = "chat_";

/// Sender name used when the signed-in user has no display name
pub const UNKNOWN_SENDER_NAME: &str = "Unknown";

/// Presence value of a user that never reported one
pub const USER_STATUS_OFFLINE: &str = "offline";

/// User-facing text surfaced when a message thread subscription is cancelled
pub const LISTEN_MESSAGES_ERROR: &str = "Failed to listen for messages";

/// User-facing text surfaced when the users listing fails
pub const LISTEN_USERS_ERROR: &str = "Error get users";

/// User-facing text surfaced when a single profile read fails
pub const FETCH_USER_ERROR: &str = "Error fetching user";
