use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Record decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Record at `{0}` is not an object")]
    NotAnObject(String),
}
