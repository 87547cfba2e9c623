/// Error types for the letter store.
/// Every operation in the crate returns `Result<T>` built on `AppError`.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Write conflict on key '{0}'")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DbError(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
