//! Common error types for carelog

use thiserror::Error;

/// Common result type for carelog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the carelog workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No valid session for a protected operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Date string not in YYYY-MM-DD form
    #[error("Malformed date: {0}")]
    MalformedDate(String),

    /// No dated records exist to bound a new semester
    #[error("Empty date range: {0}")]
    EmptyRange(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
