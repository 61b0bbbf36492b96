//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry and logged before a generic envelope goes back to the
//! client; client errors carry a readable message and, for validation, the
//! list of failed fields.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::response::{ApiResponse, FieldError};
use crate::services::ServiceError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Business rule or lookup failed in a domain service.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Declarative input constraints failed.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Body, path or query could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Token(_)
            ),
            Self::Service(ServiceError::Repository(err)) => {
                !matches!(err, RepositoryError::Conflict(_) | RepositoryError::NotFound)
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::UserAlreadyExists => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Service(err) => match err {
                ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
                    StatusCode::NOT_FOUND
                }
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(err) => err.to_string(),
            Self::Service(ServiceError::Repository(RepositoryError::Conflict(what))) => what.clone(),
            Self::Service(ServiceError::Repository(RepositoryError::NotFound)) => {
                "resource not found".to_string()
            }
            Self::Service(err) => err.to_string(),
            Self::Validation(_) => "Invalid input".to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();
        let errors = match self {
            Self::Validation(errors) => errors,
            _ => Vec::new(),
        };

        (status, ApiResponse::failure(message, errors)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            status_of(AuthError::UserAlreadyExists.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::AccountLocked.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::MissingToken.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_status_codes() {
        assert_eq!(
            status_of(ServiceError::NotFound("order").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::BadRequest("nope".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::Forbidden("mine".to_string()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(
                ServiceError::Repository(RepositoryError::Conflict("slug".to_string())).into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                ServiceError::Repository(RepositoryError::DataCorruption("x".to_string())).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = AppError::Validation(vec![FieldError {
            field: "name".to_string(),
            message: "name is required".to_string(),
        }]);
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }
}
