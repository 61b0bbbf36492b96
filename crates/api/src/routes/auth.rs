//! Authentication route handlers.
//!
//! Registration and login hand back a bearer token; there is no server-side
//! session, so logout is an acknowledgement only.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::extract::{ApiJson, trimmed, trimmed_opt};
use crate::middleware::RequireAuth;
use crate::models::user::UserProfile;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration, Session};
use crate::state::AppState;

const BOOTSTRAP_ADMIN_NAME: &str = "Administrator";

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "name must be 2-50 characters"))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "address must be at most 200 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// `{user, token}` payload returned by register and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub token: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let session = AuthService::new(state.pool(), state.jwt())
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone.filter(|s| !s.is_empty()),
            address: body.address.filter(|s| !s.is_empty()),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(SessionResponse::from(session)).with_message("Registration successful"),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let session = AuthService::new(state.pool(), state.jwt())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(ApiResponse::ok(SessionResponse::from(session)).with_message("Login successful"))
}

/// `GET /auth/me`
pub async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    ApiResponse::ok(UserProfile::from(user))
}

/// `POST /auth/logout`
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> impl IntoResponse {
    ApiResponse::message("Logged out")
}

/// `POST /auth/create-admin`
///
/// Only mounted outside production.
pub async fn create_admin(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let admin = &state.config().admin;
    let (user, created) = AuthService::new(state.pool(), state.jwt())
        .ensure_admin(
            BOOTSTRAP_ADMIN_NAME,
            &admin.email,
            admin.password.expose_secret(),
        )
        .await?;

    let message = if created {
        "Administrator account created"
    } else {
        "Administrator account already exists"
    };
    Ok(ApiResponse::ok(UserProfile::from(user)).with_message(message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let body: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": " A ",
            "email": "not-an-email",
            "password": "123"
        }))
        .unwrap();

        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name", "password"]);
    }

    #[test]
    fn test_register_contact_details_are_bounded() {
        let body: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "password": "secret1",
            "phone": "0".repeat(30),
            "address": "x".repeat(201)
        }))
        .unwrap();

        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["address", "phone"]);
    }

    #[test]
    fn test_login_request_accepts_valid_input() {
        let body: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "  shopper@example.com ",
            "password": "secret1"
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.email, "shopper@example.com");
    }
}
