use ardath_shared::constants::UNKNOWN_SENDER_NAME;
use ardath_shared::UserId;

/// The signed-in user, as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// Name stamped on outgoing messages.
    pub fn sender_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(UNKNOWN_SENDER_NAME)
    }

    /// Title the counterpart sees for a chat with this user.
    pub fn chat_title(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}
