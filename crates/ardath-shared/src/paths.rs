//! Wire contract with the realtime backend: where every record lives.
//!
//! ```text
//! chats/{userId}/{chatId}                         chat summary (per owner)
//! messages/{chatId}/{participantId}/{messageId}   message copy (per participant)
//! userChats/{userId}/{chatId}                     membership marker (`true`)
//! users/{userId}                                  profile
//! ```

use crate::types::{ChatId, MessageId, UserId};

pub const CHATS: &str = "chats";
pub const MESSAGES: &str = "messages";
pub const USER_CHATS: &str = "userChats";
pub const USERS: &str = "users";

/// Field of a message record patched on status transitions.
pub const STATUS_FIELD: &str = "status";
/// Field of a user record used for the uniqueness lookup.
pub const USERNAME_FIELD: &str = "username";

pub fn chats_of(owner: &UserId) -> String {
    format!("{CHATS}/{owner}")
}

pub fn chat(owner: &UserId, chat: &ChatId) -> String {
    format!("{CHATS}/{owner}/{chat}")
}

pub fn messages_root() -> String {
    MESSAGES.to_string()
}

/// One participant's copy of a whole thread.
pub fn thread(chat: &ChatId, participant: &UserId) -> String {
    format!("{MESSAGES}/{chat}/{participant}")
}

pub fn message(chat: &ChatId, participant: &UserId, message: &MessageId) -> String {
    format!("{MESSAGES}/{chat}/{participant}/{message}")
}

pub fn message_status(chat: &ChatId, participant: &UserId, message: &MessageId) -> String {
    format!("{MESSAGES}/{chat}/{participant}/{message}/{STATUS_FIELD}")
}

pub fn memberships_of(user: &UserId) -> String {
    format!("{USER_CHATS}/{user}")
}

pub fn membership(user: &UserId, chat: &ChatId) -> String {
    format!("{USER_CHATS}/{user}/{chat}")
}

pub fn users() -> String {
    USERS.to_string()
}

pub fn user(user: &UserId) -> String {
    format!("{USERS}/{user}")
}

pub fn username(user: &UserId) -> String {
    format!("{USERS}/{user}/{USERNAME_FIELD}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_backend_contract() {
        let u1 = UserId::from("u1");
        let c1 = ChatId::from("c1");
        let m1 = MessageId::from("m1");
        assert_eq!(chat(&u1, &c1), "chats/u1/c1");
        assert_eq!(message(&c1, &u1, &m1), "messages/c1/u1/m1");
        assert_eq!(message_status(&c1, &u1, &m1), "messages/c1/u1/m1/status");
        assert_eq!(membership(&u1, &c1), "userChats/u1/c1");
        assert_eq!(username(&u1), "users/u1/username");
    }
}
