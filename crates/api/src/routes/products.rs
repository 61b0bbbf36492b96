//! Product route handlers.

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use bazaar_core::{CategoryId, PageRequest, Price, ProductId};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery, trimmed, trimmed_list, trimmed_opt};
use crate::middleware::RequireAdmin;
use crate::models::product::{ProductFilter, ProductSort};
use crate::response::ApiResponse;
use crate::services::products::{ProductInput, ProductService, ProductUpdate};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 12;
const DEFAULT_FEATURED_LIMIT: u32 = 8;
const DEFAULT_RELATED_LIMIT: u32 = 4;

// =============================================================================
// Query Types
// =============================================================================

/// Raw listing query; every member arrives as text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub tags: Option<String>,
    pub sort: Option<String>,
    pub featured: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedQuery {
    pub product_id: Option<String>,
    pub category_id: Option<String>,
    pub limit: Option<String>,
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(raw: &str, what: &str) -> Result<i32> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {what}: {raw}")))
}

fn parse_price(raw: Option<&str>, what: &str) -> Result<Option<Price>> {
    non_blank(raw)
        .map(|s| {
            Decimal::from_str(s)
                .ok()
                .and_then(|d| Price::new(d).ok())
                .ok_or_else(|| AppError::BadRequest(format!("invalid {what}: {s}")))
        })
        .transpose()
}

fn parse_limit(raw: Option<&str>, default: u32) -> u32 {
    PageRequest::parse(None, raw, default).limit
}

/// Translate the listing query into a repository filter.
fn filter_from_query(query: &ListQuery) -> Result<ProductFilter> {
    let category = non_blank(query.category.as_deref())
        .map(|raw| parse_id(raw, "category").map(CategoryId::new))
        .transpose()?;

    let tags = non_blank(query.tags.as_deref())
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(ProductFilter {
        category,
        search: non_blank(query.search.as_deref()).map(String::from),
        min_price: parse_price(query.min_price.as_deref(), "minPrice")?,
        max_price: parse_price(query.max_price.as_deref(), "maxPrice")?,
        tags,
        featured: query.featured.as_deref().map(|f| f == "true"),
        sort: ProductSort::parse(query.sort.as_deref()),
    })
}

// =============================================================================
// Request Types
// =============================================================================

/// Largest price the `NUMERIC(12, 2)` column holds.
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn valid_price(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("range").with_message("price must be at least 0".into()));
    }
    if *value > max_price() {
        return Err(ValidationError::new("range")
            .with_message(format!("price must be at most {}", max_price()).into()));
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::new("scale")
            .with_message("price must have at most 2 decimal places".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000, message = "description must be 1-1000 characters"))]
    pub description: String,
    #[validate(custom(function = "valid_price"))]
    pub price: Decimal,
    pub category: CategoryId,
    #[serde(default, deserialize_with = "trimmed_list")]
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0, message = "stock must be at least 0"))]
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "trimmed_list")]
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 60, message = "seoTitle must be at most 60 characters"))]
    pub seo_title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 160, message = "seoDescription must be at most 160 characters"))]
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 1000, message = "description must be 1-1000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "valid_price"))]
    pub price: Option<Decimal>,
    pub category: Option<CategoryId>,
    #[serde(default, deserialize_with = "trimmed_list")]
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0, message = "stock must be at least 0"))]
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "trimmed_list")]
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 60, message = "seoTitle must be at most 60 characters"))]
    pub seo_title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 160, message = "seoDescription must be at most 160 characters"))]
    pub seo_description: Option<String>,
}

/// Validated decimals are non-negative, so this only guards the invariant.
fn to_price(amount: Decimal) -> Result<Price> {
    Price::new(amount).map_err(|e| AppError::BadRequest(e.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /products`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<impl IntoResponse> {
    let filter = filter_from_query(&query)?;
    let page = PageRequest::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_PAGE_SIZE,
    );

    let (products, pagination) = ProductService::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(ApiResponse::paginated(products, pagination))
}

/// `GET /products/featured`
pub async fn featured(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_FEATURED_LIMIT);
    let products = ProductService::new(state.pool()).featured(limit).await?;
    Ok(ApiResponse::ok(products))
}

/// `GET /products/related`
pub async fn related(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> Result<impl IntoResponse> {
    let (Some(product), Some(category)) = (
        non_blank(query.product_id.as_deref()),
        non_blank(query.category_id.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "productId and categoryId are required".to_string(),
        ));
    };

    let product = ProductId::new(parse_id(product, "productId")?);
    let category = CategoryId::new(parse_id(category, "categoryId")?);
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_RELATED_LIMIT);

    let products = ProductService::new(state.pool())
        .related(product, category, limit)
        .await?;
    Ok(ApiResponse::ok(products))
}

/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse> {
    let product = ProductService::new(state.pool()).get(id).await?;
    Ok(ApiResponse::ok(product))
}

/// `GET /products/slug/{slug}`
pub async fn show_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let product = ProductService::new(state.pool()).get_by_slug(&slug).await?;
    Ok(ApiResponse::ok(product))
}

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    let product = ProductService::new(state.pool())
        .create(ProductInput {
            name: body.name,
            description: body.description,
            price: to_price(body.price)?,
            category: body.category,
            images: body.images.unwrap_or_default(),
            stock: body.stock,
            tags: body.tags.unwrap_or_default(),
            featured: body.featured,
            seo_title: body.seo_title,
            seo_description: body.seo_description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(product).with_message("Product created"),
    ))
}

/// `PUT /products/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<impl IntoResponse> {
    let product = ProductService::new(state.pool())
        .update(
            id,
            ProductUpdate {
                name: body.name,
                description: body.description,
                price: body.price.map(to_price).transpose()?,
                category: body.category,
                images: body.images,
                stock: body.stock,
                tags: body.tags,
                is_active: body.is_active,
                featured: body.featured,
                seo_title: body.seo_title,
                seo_description: body.seo_description,
            },
        )
        .await?;

    Ok(ApiResponse::ok(product).with_message("Product updated"))
}

/// `DELETE /products/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse> {
    ProductService::new(state.pool()).delete(id).await?;
    Ok(ApiResponse::message("Product deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let object: serde_json::Map<_, _> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    #[test]
    fn test_filter_from_query() {
        let filter = filter_from_query(&query(&[
            ("category", "3"),
            ("minPrice", "10.5"),
            ("tags", "summer, linen,,"),
            ("sort", "price_desc"),
            ("featured", "true"),
        ]))
        .unwrap();

        assert_eq!(filter.category, Some(CategoryId::new(3)));
        assert_eq!(filter.min_price.unwrap().amount(), Decimal::new(105, 1));
        assert!(filter.max_price.is_none());
        assert_eq!(filter.tags, vec!["summer".to_string(), "linen".to_string()]);
        assert_eq!(filter.sort, ProductSort::PriceDesc);
        assert_eq!(filter.featured, Some(true));
    }

    #[test]
    fn test_featured_other_values_mean_not_featured() {
        let filter = filter_from_query(&query(&[("featured", "yes")])).unwrap();
        assert_eq!(filter.featured, Some(false));
        assert_eq!(filter_from_query(&ListQuery::default()).unwrap().featured, None);
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(filter_from_query(&query(&[("minPrice", "cheap")])).is_err());
        assert!(filter_from_query(&query(&[("maxPrice", "-1")])).is_err());
        assert!(filter_from_query(&query(&[("category", "abc")])).is_err());
    }

    #[test]
    fn test_negative_price_is_a_field_error() {
        let body: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Linen Shirt",
            "description": "Breathable",
            "price": "-1.00",
            "category": 1,
            "stock": -2
        }))
        .unwrap();

        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "stock"]);
        assert_eq!(errors[0].message, "price must be at least 0");
    }

    #[test]
    fn test_price_must_fit_the_catalog_column() {
        let create = |price: &str| -> CreateProductRequest {
            serde_json::from_value(serde_json::json!({
                "name": "Linen Shirt",
                "description": "Breathable",
                "price": price,
                "category": 1
            }))
            .unwrap()
        };

        assert!(create("9999999999.99").validate().is_ok());
        assert!(create("12.50").validate().is_ok());
        assert!(create("12.5000").validate().is_ok());

        let errors = crate::extract::field_errors(&create("10000000000").validate().unwrap_err());
        assert_eq!(errors[0].field, "price");
        assert_eq!(errors[0].message, "price must be at most 9999999999.99");

        let errors = crate::extract::field_errors(&create("1.999").validate().unwrap_err());
        assert_eq!(errors[0].message, "price must have at most 2 decimal places");

        let update: UpdateProductRequest =
            serde_json::from_value(serde_json::json!({ "price": "1000000000000" })).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_limit_parsing_falls_back() {
        assert_eq!(parse_limit(None, 8), 8);
        assert_eq!(parse_limit(Some("3"), 8), 3);
        assert_eq!(parse_limit(Some("zero"), 4), 4);
    }
}
