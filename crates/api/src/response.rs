//! The JSON envelope every endpoint responds with.
//!
//! ```json
//! { "success": true, "message": "...", "data": {}, "errors": [], "pagination": {} }
//! ```
//!
//! Members that carry nothing are omitted.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use bazaar_core::Pagination;

/// One failed input constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
            pagination: None,
        }
    }

    /// Successful list response with its pagination block.
    pub const fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
            pagination: Some(pagination),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Successful response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: None,
            pagination: None,
        }
    }

    /// Failure envelope; `errors` is omitted when empty.
    pub fn failure(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors: (!errors.is_empty()).then_some(errors),
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::PageRequest;

    #[test]
    fn test_absent_members_are_omitted() {
        let json = serde_json::to_value(ApiResponse::message("Logged out")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "Logged out"}));
    }

    #[test]
    fn test_paginated_envelope() {
        let pagination = Pagination::new(PageRequest::parse(Some("2"), Some("10"), 10), 25);
        let json = serde_json::to_value(ApiResponse::paginated(vec![1, 2], pagination)).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(
            json["pagination"],
            serde_json::json!({"page": 2, "limit": 10, "total": 25, "pages": 3})
        );
    }

    #[test]
    fn test_failure_with_field_errors() {
        let errors = vec![FieldError {
            field: "email".to_string(),
            message: "invalid email".to_string(),
        }];
        let json = serde_json::to_value(ApiResponse::failure("Invalid input", errors)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "email");
        assert!(json.get("data").is_none());
    }
}
