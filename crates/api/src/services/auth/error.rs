//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("account is locked")]
    AccountLocked,

    /// Email already registered.
    #[error("email is already registered")]
    UserAlreadyExists,

    /// Missing or malformed `Authorization` header.
    #[error("authentication token required")]
    MissingToken,

    /// Token failed signature or expiry checks, or names no account.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Authenticated but not an administrator.
    #[error("administrator access required")]
    Forbidden,

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
