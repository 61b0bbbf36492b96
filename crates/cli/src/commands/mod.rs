//! Subcommand implementations.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;

/// Read the database URL the API uses (`API_DATABASE_URL`, then `DATABASE_URL`).
pub(crate) fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
