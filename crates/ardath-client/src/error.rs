use ardath_shared::ModelError;
use ardath_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Username is already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
