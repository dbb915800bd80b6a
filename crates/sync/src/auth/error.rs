//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
///
/// Messages are shown to the user verbatim.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] folio_core::EmailError),

    /// Wrong password or unknown account.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("User already registered")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// The operation needs a signed-in admin.
    #[error("You must be signed in to do that")]
    NotAuthenticated,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Session bookkeeping failed.
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}
