//! Administrator account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new administrator
//! bazaar-cli admin create -e admin@example.com -n "Store Admin" -p 's3cret-pass'
//!
//! # Grant the admin role to an existing customer
//! bazaar-cli admin promote -e owner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use bazaar_api::db::{RepositoryError, UserRepository, create_pool};
use bazaar_api::models::user::NewUser;
use bazaar_api::services::auth::{AuthError, hash_password};
use bazaar_core::{Email, UserId, UserRole};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: API_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("No user with email: {0}")]
    UserNotFound(String),
}

impl From<AuthError> for AdminError {
    fn from(_: AuthError) -> Self {
        Self::PasswordHash
    }
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

/// Create a new administrator account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken or the
/// database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = parse_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Creating administrator: {}", email);

    let user = UserRepository::new(&pool)
        .create(&NewUser {
            name: name.trim().to_owned(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
            phone: None,
            address: None,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        "Administrator created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Grant the admin role to an existing account.
///
/// # Errors
///
/// Returns an error if no account has this email or the database is
/// unreachable.
pub async fn promote(email: &str) -> Result<UserId, AdminError> {
    let email = parse_email(email)?;

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!("{} ({}) is now an administrator", user.name, user.email);
    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_input_checked_before_connecting() {
        assert!(matches!(
            create_user("not-an-email", "Admin", "secret123").await,
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            create_user("admin@example.com", "Admin", "123").await,
            Err(AdminError::WeakPassword)
        ));
        assert!(matches!(
            promote("nope").await,
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
