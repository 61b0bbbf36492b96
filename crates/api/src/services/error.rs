//! Errors shared by the catalog and order services.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The named entity does not exist (or is hidden from the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A business rule rejected the request.
    #[error("{0}")]
    BadRequest(String),

    /// The caller may not act on this resource.
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}
