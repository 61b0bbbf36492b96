//! Request extractors that reject through the JSON envelope.
//!
//! `ApiJson` deserializes and then runs the body's `validator` rules, so
//! handlers only ever see input that passed every declared constraint.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;
use crate::response::FieldError;

/// JSON body that has passed validation.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;
        Ok(Self(value))
    }
}

/// A body without a JSON content type is treated as absent.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let Some(Json(value)) =
            <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?
        else {
            return Ok(None);
        };
        value
            .validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;
        Ok(Some(Self(value)))
    }
}

/// Path parameters; a malformed id becomes a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string; a malformed query becomes a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Flatten nested validation errors into `{field, message}` pairs.
///
/// Nested structs and list elements produce paths such as
/// `shippingAddress.phone` and `items[0].quantity`. Output is sorted by field
/// so responses are stable.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    let kinds: &HashMap<_, ValidationErrorsKind> = errors.errors();
    for (field, kind) in kinds {
        let name = camel_case(&field.to_string());
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|err| FieldError {
                    field: path.clone(),
                    message: err
                        .message
                        .as_ref()
                        .map_or_else(|| format!("{path} is invalid"), ToString::to_string),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Trimming deserializers
// =============================================================================

/// Deserialize a string with surrounding whitespace removed.
///
/// # Errors
///
/// Propagates the deserializer's error for non-string input.
pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

/// Like [`trimmed`] for optional fields.
///
/// # Errors
///
/// Propagates the deserializer's error for non-string input.
pub fn trimmed_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

/// Like [`trimmed_opt`], but a blank string counts as absent.
///
/// # Errors
///
/// Propagates the deserializer's error for non-string input.
pub fn non_blank_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    trimmed_opt(deserializer).map(|s| s.filter(|s| !s.is_empty()))
}

/// Like [`trimmed`] for lists of strings; blank entries are dropped.
///
/// # Errors
///
/// Propagates the deserializer's error for non-list input.
pub fn trimmed_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Option::<Vec<String>>::deserialize(deserializer).map(|list| {
        list.map(|items| {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    })
}
