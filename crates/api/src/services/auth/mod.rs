//! Authentication service.
//!
//! Password accounts with argon2 hashes and stateless bearer tokens.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, JwtKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use bazaar_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, User};

/// Data collected by the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Outcome of a successful registration or login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
        }
    }

    /// Register a customer account and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<Session, AuthError> {
        let email = Email::parse(&registration.email)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .create(&NewUser {
                name: registration.name,
                email,
                password_hash,
                role: UserRole::Customer,
                phone: registration.phone,
                address: registration.address,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.keys.issue(user.id)?;
        Ok(Session { user, token })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the password is wrong.
    /// Returns `AuthError::AccountLocked` if the account has been deactivated.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountLocked);
        }

        verify_password(password, &password_hash)?;

        let token = self.keys.issue(user.id)?;
        Ok(Session { user, token })
    }

    /// Resolve a bearer token to an active account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is bad or names no account.
    /// Returns `AuthError::AccountLocked` if the account has been deactivated.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.keys.verify(token)?;
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::AccountLocked);
        }
        Ok(user)
    }

    /// Create the bootstrap administrator unless an account with that email exists.
    ///
    /// Returns the account and whether it was created by this call.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the configured email is invalid.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, bool), AuthError> {
        let email = Email::parse(email)?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            return Ok((existing, false));
        }

        let password_hash = hash_password(password)?;
        let created = self
            .users
            .create(&NewUser {
                name: name.to_string(),
                email: email.clone(),
                password_hash,
                role: UserRole::Admin,
                phone: None,
                address: None,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %user.email, "Administrator account created");
                Ok((user, true))
            }
            // Lost a race with a concurrent bootstrap call
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .users
                    .get_by_email(&email)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok((existing, false))
            }
            Err(other) => Err(other.into()),
        }
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Hash a password using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
