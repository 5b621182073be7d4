use thiserror::Error;

use closet_shared::error::PasswordError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The record does not exist, or is not owned by the caller.
    #[error("Record not found")]
    NotFound,

    /// A user with this email is already registered.
    #[error("User already exists")]
    Duplicate,

    /// Email unknown or password mismatch. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The acting user id does not resolve to a stored user.
    #[error("Unknown user")]
    UnknownUser,

    /// Required field missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing failure.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Map `QueryReturnedNoRows` to [`StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}
