pub mod chat;
pub mod user;

pub use chat::ChatViewModel;
pub use user::UserViewModel;
