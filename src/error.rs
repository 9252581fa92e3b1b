//! Error types for studyhall.

use thiserror::Error;

/// Common error type for storage and configuration failures.
///
/// Domain-level authentication outcomes live in [`crate::auth::AuthError`];
/// this type covers the opaque underlying failures (I/O, SQL, config) plus
/// the two store-level outcomes every entity table shares.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error.
    ///
    /// Wraps any sqlx error that is not a recognized constraint violation.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No live (non-deleted) record matched.
    #[error("{0} not found")]
    NotFound(String),

    /// A non-deleted record with this username already exists.
    #[error("username already exists")]
    DuplicateUsername,
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        // The live-username partial unique index reports concurrent duplicate
        // registrations as a unique violation; surface it as the domain error.
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return Error::DuplicateUsername;
            }
        }
        Error::Database(e.to_string())
    }
}

/// Result type alias for studyhall operations.
pub type Result<T> = std::result::Result<T, Error>;
