use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session token is malformed")]
    Malformed,

    #[error("Session token signature is invalid")]
    BadSignature,

    #[error("Session token has expired")]
    Expired,
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Stored password hash is invalid: {0}")]
    InvalidHash(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown clothing category: {0}")]
pub struct UnknownCategory(pub String);
