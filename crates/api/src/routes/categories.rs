//! Category route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use bazaar_core::CategoryId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery, trimmed, trimmed_opt};
use crate::middleware::RequireAdmin;
use crate::response::ApiResponse;
use crate::services::categories::{CategoryInput, CategoryService, CategoryUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub include_inactive: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub image: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// `GET /categories`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<impl IntoResponse> {
    let include_inactive = query.include_inactive.as_deref() == Some("true");
    let categories = CategoryService::new(state.pool())
        .list(include_inactive)
        .await?;
    Ok(ApiResponse::ok(categories))
}

/// `GET /categories/with-count`
pub async fn list_with_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = CategoryService::new(state.pool())
        .list_with_product_count()
        .await?;
    Ok(ApiResponse::ok(categories))
}

/// `GET /categories/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<impl IntoResponse> {
    let category = CategoryService::new(state.pool()).get(id).await?;
    Ok(ApiResponse::ok(category))
}

/// `GET /categories/slug/{slug}`
pub async fn show_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let category = CategoryService::new(state.pool())
        .get_by_slug(&slug)
        .await?;
    Ok(ApiResponse::ok(category))
}

/// `POST /categories`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = CategoryService::new(state.pool())
        .create(CategoryInput {
            name: body.name,
            description: body.description,
            image: body.image,
            sort_order: body.sort_order,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(category).with_message("Category created"),
    ))
}

/// `PUT /categories/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = CategoryService::new(state.pool())
        .update(
            id,
            CategoryUpdate {
                name: body.name,
                description: body.description,
                image: body.image,
                is_active: body.is_active,
                sort_order: body.sort_order,
            },
        )
        .await?;

    Ok(ApiResponse::ok(category).with_message("Category updated"))
}

/// `DELETE /categories/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<impl IntoResponse> {
    CategoryService::new(state.pool()).delete(id).await?;
    Ok(ApiResponse::message("Category deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_fails_after_trimming() {
        let body: CreateCategoryRequest =
            serde_json::from_value(serde_json::json!({"name": "   "})).unwrap();
        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_update_allows_partial_body() {
        let body: UpdateCategoryRequest =
            serde_json::from_value(serde_json::json!({"isActive": false})).unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.is_active, Some(false));
        assert!(body.name.is_none());
    }
}
