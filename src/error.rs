use thiserror::Error;

pub type Result<T> = std::result::Result<T, SwapError>;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        SwapError::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for SwapError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        SwapError::Auth(err.to_string())
    }
}

impl From<uuid::Error> for SwapError {
    fn from(err: uuid::Error) -> Self {
        SwapError::Validation(err.to_string())
    }
}

impl From<std::io::Error> for SwapError {
    fn from(err: std::io::Error) -> Self {
        SwapError::Io(err.to_string())
    }
}
