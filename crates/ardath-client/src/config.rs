//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so an embedder can start with
//! `ClientConfig::default()` and only override what it needs.

use std::str::FromStr;
use std::time::Duration;

use ardath_shared::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_PAGE_SIZE, DEFAULT_USER_PAGE_SIZE, FETCH_USER_ERROR,
    LISTEN_MESSAGES_ERROR, LISTEN_USERS_ERROR, NOTIFICATION_TOPIC_PREFIX, USERNAME_DEBOUNCE_MS,
};

/// When incoming messages are marked READ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Only when the UI reports the thread is on screen (`mark_chat_read`).
    #[default]
    Foreground,
    /// On every thread snapshot that contains unread incoming messages.
    OnSnapshot,
}

impl FromStr for ReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "foreground" => Ok(ReadPolicy::Foreground),
            "snapshot" => Ok(ReadPolicy::OnSnapshot),
            other => Err(format!("unknown read policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chats per page when the caller passes 0.
    /// Env: `ARDATH_PAGE_SIZE`
    pub page_size: usize,

    /// Capacity of every bounded delta/result channel.
    /// Env: `ARDATH_CHANNEL_CAPACITY`
    pub channel_capacity: usize,

    /// Quiet period before a username availability check runs.
    /// Env: `ARDATH_USERNAME_DEBOUNCE_MS`
    pub username_debounce: Duration,

    /// Env: `ARDATH_READ_POLICY` (`foreground` | `snapshot`)
    pub read_policy: ReadPolicy,

    /// Upper bound of the one-shot users listing.
    /// Env: `ARDATH_USER_PAGE_SIZE`
    pub user_page_size: usize,

    /// Push topics are `{prefix}{chatId}`.
    /// Env: `ARDATH_NOTIFICATION_TOPIC_PREFIX`
    pub notification_topic_prefix: String,

    // -- User-facing texts --
    pub listen_messages_error: String,
    pub listen_users_error: String,
    pub fetch_user_error: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            username_debounce: Duration::from_millis(USERNAME_DEBOUNCE_MS),
            read_policy: ReadPolicy::default(),
            user_page_size: DEFAULT_USER_PAGE_SIZE,
            notification_topic_prefix: NOTIFICATION_TOPIC_PREFIX.to_string(),
            listen_messages_error: LISTEN_MESSAGES_ERROR.to_string(),
            listen_users_error: LISTEN_USERS_ERROR.to_string(),
            fetch_user_error: FETCH_USER_ERROR.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("ARDATH_PAGE_SIZE") {
            match val.trim().parse::<i64>() {
                Ok(n) if n > 0 => config.page_size = n as usize,
                _ => tracing::warn!(value = %val, "Invalid ARDATH_PAGE_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("ARDATH_CHANNEL_CAPACITY") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.channel_capacity = n,
                _ => tracing::warn!(value = %val, "Invalid ARDATH_CHANNEL_CAPACITY, using default"),
            }
        }

        if let Some(val) = lookup("ARDATH_USERNAME_DEBOUNCE_MS") {
            if let Ok(ms) = val.trim().parse::<u64>() {
                config.username_debounce = Duration::from_millis(ms);
            } else {
                tracing::warn!(value = %val, "Invalid ARDATH_USERNAME_DEBOUNCE_MS, using default");
            }
        }

        if let Some(val) = lookup("ARDATH_READ_POLICY") {
            match val.parse::<ReadPolicy>() {
                Ok(policy) => config.read_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid ARDATH_READ_POLICY, using default"),
            }
        }

        if let Some(val) = lookup("ARDATH_USER_PAGE_SIZE") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.user_page_size = n,
                _ => tracing::warn!(value = %val, "Invalid ARDATH_USER_PAGE_SIZE, using default"),
            }
        }

        if let Some(prefix) = lookup("ARDATH_NOTIFICATION_TOPIC_PREFIX") {
            config.notification_topic_prefix = prefix;
        }

        config
    }

    /// Page size actually queried: non-positive requests use the default.
    pub fn effective_page_size(&self, requested: usize) -> usize {
        if requested == 0 {
            self.page_size
        } else {
            requested
        }
    }

    pub fn notification_topic(&self, chat_id: &str) -> String {
        format!("{}{}", self.notification_topic_prefix, chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.user_page_size, 20);
        assert_eq!(config.username_debounce, Duration::from_millis(100));
        assert_eq!(config.read_policy, ReadPolicy::Foreground);
        assert_eq!(config.notification_topic("c1"), "chat_c1");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ARDATH_PAGE_SIZE", "25"),
            ("ARDATH_READ_POLICY", "snapshot"),
            ("ARDATH_NOTIFICATION_TOPIC_PREFIX", "room_"),
        ]));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.read_policy, ReadPolicy::OnSnapshot);
        assert_eq!(config.notification_topic("c1"), "room_c1");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ARDATH_PAGE_SIZE", "-3"),
            ("ARDATH_CHANNEL_CAPACITY", "zero"),
            ("ARDATH_READ_POLICY", "sometimes"),
        ]));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.read_policy, ReadPolicy::Foreground);
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        let config = ClientConfig::default();
        assert_eq!(config.effective_page_size(0), 10);
        assert_eq!(config.effective_page_size(3), 3);
    }
}
