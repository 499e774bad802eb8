// Error handling for the authorizer
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid permission symbol '{0}' (expected one of \"elradfmwMT\")")]
    InvalidPermission(char),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Username must not be empty")]
    EmptyUsername,
}
