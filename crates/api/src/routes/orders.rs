//! Order route handlers.

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use bazaar_core::{OrderId, OrderStatus, PageRequest, PaymentMethod, ProductId, UserId};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery, non_blank_opt, trimmed, trimmed_opt};
use crate::middleware::{OptionalAuth, RequireAdmin, RequireAuth};
use crate::models::order::{OrderFilter, PaymentInfo, ShippingAddress};
use crate::response::ApiResponse;
use crate::services::orders::{OrderInput, OrderLine, OrderService, StatusChange, parse_date_bound};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// Request Types
// =============================================================================

fn known_payment_method(value: &str) -> std::result::Result<(), ValidationError> {
    PaymentMethod::from_str(value).map(|_| ()).map_err(|_| {
        ValidationError::new("enum")
            .with_message("paymentMethod must be one of bank_transfer, momo, zalopay".into())
    })
}

fn known_status(value: &str) -> std::result::Result<(), ValidationError> {
    OrderStatus::from_str(value).map(|_| ()).map_err(|_| {
        ValidationError::new("enum").with_message(
            "status must be one of pending, paid, processing, shipped, delivered, cancelled"
                .into(),
        )
    })
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct OrderItemRequest {
    pub product: ProductId,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "recipient name must be 1-100 characters"))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200, message = "address must be 1-200 characters"))]
    pub address: String,
    #[serde(default, deserialize_with = "non_blank_opt")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "non_blank_opt")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "non_blank_opt")]
    pub ward: Option<String>,
    #[serde(default, deserialize_with = "non_blank_opt")]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(req: ShippingAddressRequest) -> Self {
        Self {
            name: req.name,
            phone: req.phone,
            address: req.address,
            city: req.city,
            district: req.district,
            ward: req.ward,
            email: req.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
    #[validate(nested)]
    pub shipping_address: ShippingAddressRequest,
    #[validate(custom(function = "known_payment_method"))]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Payment details; `trackingNumber` is also accepted here for older clients.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfoRequest {
    #[serde(flatten)]
    pub info: PaymentInfo,
    #[serde(default, deserialize_with = "non_blank_opt")]
    #[validate(length(max = 100, message = "trackingNumber must be at most 100 characters"))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(custom(function = "known_status"))]
    pub status: String,
    #[validate(nested)]
    pub payment_info: Option<PaymentInfoRequest>,
    #[serde(default, deserialize_with = "non_blank_opt")]
    #[validate(length(max = 100, message = "trackingNumber must be at most 100 characters"))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "reason must be at most 200 characters"))]
    pub reason: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn date_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = non_blank(from)
        .map(|raw| parse_date_bound(raw, false))
        .transpose()?;
    let to = non_blank(to)
        .map(|raw| parse_date_bound(raw, true))
        .transpose()?;
    Ok((from, to))
}

fn parse_enum<T: FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>> {
    non_blank(raw)
        .map(|s| T::from_str(s).map_err(AppError::BadRequest))
        .transpose()
}

fn filter_from_query(query: &ListQuery) -> Result<OrderFilter> {
    let (date_from, date_to) = date_range(query.date_from.as_deref(), query.date_to.as_deref())?;
    Ok(OrderFilter {
        status: parse_enum(query.status.as_deref())?,
        payment_method: parse_enum(query.payment_method.as_deref())?,
        date_from,
        date_to,
    })
}

fn order_input(body: CreateOrderRequest) -> Result<OrderInput> {
    let items = body
        .items
        .iter()
        .map(|item| {
            u32::try_from(item.quantity)
                .map(|quantity| OrderLine {
                    product: item.product,
                    quantity,
                })
                .map_err(|_| AppError::BadRequest("quantity must be at least 1".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let payment_method = parse_enum(body.payment_method.as_deref())?.unwrap_or_default();

    Ok(OrderInput {
        items,
        payment_method,
        shipping_address: body.shipping_address.into(),
        notes: body.notes.filter(|n| !n.is_empty()),
    })
}

fn status_change(body: UpdateStatusRequest) -> Result<StatusChange> {
    let status = OrderStatus::from_str(&body.status).map_err(AppError::BadRequest)?;
    let (payment_info, nested_tracking) = match body.payment_info {
        Some(req) => (Some(req.info), req.tracking_number),
        None => (None, None),
    };

    Ok(StatusChange {
        status,
        payment_info,
        tracking_number: body.tracking_number.or(nested_tracking),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /orders`
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let input = order_input(body)?;
    let order = OrderService::new(state.pool())
        .create(input, customer.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(order).with_message("Order placed"),
    ))
}

/// `GET /orders`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<impl IntoResponse> {
    let filter = filter_from_query(&query)?;
    let page = PageRequest::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_PAGE_SIZE,
    );

    let (orders, pagination) = OrderService::new(state.pool()).list(&filter, page).await?;
    Ok(ApiResponse::paginated(orders, pagination))
}

/// `GET /orders/user/{id}`
pub async fn list_for_user(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(user_id): ApiPath<UserId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_PAGE_SIZE,
    );

    let (orders, pagination) = OrderService::new(state.pool())
        .list_for_user(&caller, user_id, page)
        .await?;
    Ok(ApiResponse::paginated(orders, pagination))
}

/// `GET /orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderService::new(state.pool()).get(id, &caller).await?;
    Ok(ApiResponse::ok(order))
}

/// `PUT /orders/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let change = status_change(body)?;
    let order = OrderService::new(state.pool())
        .update_status(id, change)
        .await?;
    Ok(ApiResponse::ok(order).with_message("Order status updated"))
}

/// `POST /orders/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
    body: Option<ApiJson<CancelRequest>>,
) -> Result<impl IntoResponse> {
    let reason = body.and_then(|ApiJson(body)| body.reason);
    let order = OrderService::new(state.pool())
        .cancel(id, &caller, reason.as_deref())
        .await?;
    Ok(ApiResponse::ok(order).with_message("Order cancelled"))
}

/// `GET /orders/stats/overview`
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = date_range(query.date_from.as_deref(), query.date_to.as_deref())?;
    let stats = OrderService::new(state.pool()).stats(from, to).await?;
    Ok(ApiResponse::ok(stats))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkout(body: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid_address() -> serde_json::Value {
        serde_json::json!({
            "name": "Lan Nguyen",
            "phone": "0901234567",
            "address": "12 Hang Bac"
        })
    }

    #[test]
    fn test_checkout_validation_paths() {
        let body = checkout(serde_json::json!({
            "items": [{"product": 1, "quantity": 1}, {"product": 2, "quantity": 0}],
            "shippingAddress": {"name": "Lan", "phone": "123", "address": "x"},
            "paymentMethod": "cash"
        }));

        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["items[1].quantity", "paymentMethod", "shippingAddress.phone"]
        );
    }

    #[test]
    fn test_empty_items_rejected() {
        let body = checkout(serde_json::json!({
            "items": [],
            "shippingAddress": valid_address()
        }));
        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        assert_eq!(errors[0].field, "items");
    }

    #[test]
    fn test_order_input_defaults() {
        let body = checkout(serde_json::json!({
            "items": [{"product": 7, "quantity": 2, "price": "0.01"}],
            "shippingAddress": valid_address(),
            "notes": "  "
        }));
        assert!(body.validate().is_ok());

        let input = order_input(body).unwrap();
        assert_eq!(input.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(
            input.items,
            vec![OrderLine {
                product: ProductId::new(7),
                quantity: 2
            }]
        );
        assert!(input.notes.is_none());
        assert!(input.shipping_address.city.is_none());
    }

    #[test]
    fn test_tracking_number_fallback() {
        let body: UpdateStatusRequest = serde_json::from_value(serde_json::json!({
            "status": "shipped",
            "paymentInfo": {"transactionId": "TX-9", "trackingNumber": "VN123"}
        }))
        .unwrap();
        assert!(body.validate().is_ok());

        let change = status_change(body).unwrap();
        assert_eq!(change.status, OrderStatus::Shipped);
        assert_eq!(change.tracking_number.as_deref(), Some("VN123"));
        assert_eq!(
            change.payment_info.unwrap().transaction_id.as_deref(),
            Some("TX-9")
        );
    }

    #[test]
    fn test_tracking_number_fits_its_column() {
        let body: UpdateStatusRequest = serde_json::from_value(serde_json::json!({
            "status": "shipped",
            "trackingNumber": "T".repeat(150)
        }))
        .unwrap();
        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        assert_eq!(errors[0].field, "trackingNumber");

        let body: UpdateStatusRequest = serde_json::from_value(serde_json::json!({
            "status": "shipped",
            "paymentInfo": {"trackingNumber": "T".repeat(101)}
        }))
        .unwrap();
        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        assert_eq!(errors[0].field, "paymentInfo.trackingNumber");
    }

    #[test]
    fn test_blank_optional_address_fields_are_absent() {
        let mut address = valid_address();
        address["email"] = serde_json::json!("   ");
        address["ward"] = serde_json::json!("");
        let body = checkout(serde_json::json!({
            "items": [{"product": 1, "quantity": 1}],
            "shippingAddress": address
        }));
        assert!(body.validate().is_ok());

        let input = order_input(body).unwrap();
        assert!(input.shipping_address.email.is_none());
        assert!(input.shipping_address.ward.is_none());
    }

    #[test]
    fn test_unknown_status_is_a_field_error() {
        let body: UpdateStatusRequest =
            serde_json::from_value(serde_json::json!({"status": "lost"})).unwrap();
        let errors = crate::extract::field_errors(&body.validate().unwrap_err());
        assert_eq!(errors[0].field, "status");
    }

    #[test]
    fn test_list_filter_parsing() {
        let query = ListQuery {
            status: Some("paid".to_string()),
            payment_method: Some("momo".to_string()),
            date_to: Some("2026-01-31".to_string()),
            ..ListQuery::default()
        };
        let filter = filter_from_query(&query).unwrap();
        assert_eq!(filter.status, Some(OrderStatus::Paid));
        assert_eq!(filter.payment_method, Some(PaymentMethod::Momo));
        assert!(filter.date_from.is_none());
        assert!(filter.date_to.is_some());

        let bad = ListQuery {
            status: Some("lost".to_string()),
            ..ListQuery::default()
        };
        assert!(filter_from_query(&bad).is_err());
    }
}
