//! Checkout and order management.
//!
//! Totals are always recomputed from live product prices; whatever price a
//! client sends is ignored. Each line item freezes the product's name, price
//! and first image so later catalog edits never reach placed orders.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{
    OrderId, OrderStatus, PageRequest, Pagination, PaymentMethod, Price, ProductId, UserId,
};

use super::ServiceError;
use crate::db::{OrderRepository, ProductRepository};
use crate::models::order::{
    NewOrder, OrderFilter, OrderItem, OrderStats, OrderView, PaymentInfo, ShippingAddress,
};
use crate::models::product::Product;
use crate::models::user::User;

/// One requested line of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// Validated checkout input.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

/// Status change requested by an administrator.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub payment_info: Option<PaymentInfo>,
    pub tracking_number: Option<String>,
}

/// Largest total the `NUMERIC(14, 2)` order column holds.
fn max_order_total() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Price each requested line against the current catalog.
///
/// # Errors
///
/// Returns `ServiceError::BadRequest` when a product is missing or inactive,
/// when a quantity exceeds the recorded stock, or when the total is too
/// large to record.
pub fn build_line_items(
    requested: &[OrderLine],
    products: &HashMap<ProductId, Product>,
) -> Result<(Vec<OrderItem>, Price), ServiceError> {
    let mut items = Vec::with_capacity(requested.len());

    for line in requested {
        let product = products
            .get(&line.product)
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                ServiceError::bad_request(format!("product {} is not available", line.product))
            })?;

        let in_stock = u32::try_from(product.stock).unwrap_or(0);
        if line.quantity > in_stock {
            return Err(ServiceError::bad_request(format!(
                "not enough stock for {}: only {in_stock} left",
                product.name
            )));
        }

        items.push(OrderItem {
            product: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            image: product.primary_image().map(String::from),
        });
    }

    let total: Price = items.iter().map(OrderItem::line_total).sum();
    if total.amount() > max_order_total() {
        return Err(ServiceError::bad_request(format!(
            "order total must be at most {}",
            max_order_total()
        )));
    }
    Ok((items, total))
}

/// Parse a `dateFrom`/`dateTo` query value.
///
/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain date used
/// as an upper bound covers the whole day.
///
/// # Errors
///
/// Returns `ServiceError::BadRequest` for anything else.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ServiceError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ServiceError::bad_request(format!("invalid date: {raw}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| ServiceError::bad_request(format!("invalid date: {raw}")))
}

pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Place an order for `customer`, or as a guest when there is none.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::BadRequest` if any line cannot be fulfilled.
    pub async fn create(
        &self,
        input: OrderInput,
        customer: Option<&User>,
    ) -> Result<OrderView, ServiceError> {
        let ids: Vec<ProductId> = input.items.iter().map(|line| line.product).collect();
        let products: HashMap<ProductId, Product> = self
            .products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // TODO: decrement stock inside the insert transaction once reservations are agreed on.
        let (items, total_amount) = build_line_items(&input.items, &products)?;

        let guest_info = match customer {
            Some(_) => None,
            None => Some(input.shipping_address.guest_info()),
        };

        let order = self
            .orders
            .create(&NewOrder {
                user_id: customer.map(|u| u.id),
                guest_info,
                items,
                total_amount,
                payment_method: input.payment_method,
                shipping_address: input.shipping_address,
                notes: input.notes,
            })
            .await?;

        tracing::info!(
            order_id = %order.order.id,
            guest = order.order.is_guest,
            total = %order.order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<OrderView>, Pagination), ServiceError> {
        let (orders, total) = self.orders.list(filter, page).await?;
        Ok((orders, Pagination::new(page, total)))
    }

    /// Orders belonging to `target`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless `caller` is `target` or an admin.
    pub async fn list_for_user(
        &self,
        caller: &User,
        target: UserId,
        page: PageRequest,
    ) -> Result<(Vec<OrderView>, Pagination), ServiceError> {
        if !caller.is_admin() && caller.id != target {
            return Err(ServiceError::Forbidden(
                "you can only view your own orders".to_string(),
            ));
        }
        let (orders, total) = self.orders.list_for_user(target, page).await?;
        Ok((orders, Pagination::new(page, total)))
    }

    /// An order visible to `caller`; other customers' orders are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if missing or not visible.
    pub async fn get(&self, id: OrderId, caller: &User) -> Result<OrderView, ServiceError> {
        self.orders
            .get_by_id(id)
            .await?
            .filter(|view| view.order.is_visible_to(caller))
            .ok_or(ServiceError::NotFound("order"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> Result<OrderView, ServiceError> {
        let existing = self
            .orders
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?
            .order;

        let mut payment_info = existing.payment_info;
        if let Some(update) = change.payment_info {
            payment_info.merge(update);
        }
        if change.status == OrderStatus::Paid {
            payment_info.payment_date = Some(Utc::now());
        }

        let tracking = change
            .tracking_number
            .as_deref()
            .filter(|_| change.status == OrderStatus::Shipped);

        let order = self
            .orders
            .update_status(id, change.status, &payment_info, tracking)
            .await?;

        tracing::info!(
            order_id = %id,
            from = %existing.status,
            to = %change.status,
            "Order status updated"
        );
        Ok(order)
    }

    /// Cancel a pending or paid order, appending `reason` to its notes.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist or
    /// `caller` neither owns it nor is an admin, and
    /// `ServiceError::BadRequest` if it is past the cancellable states.
    pub async fn cancel(
        &self,
        id: OrderId,
        caller: &User,
        reason: Option<&str>,
    ) -> Result<OrderView, ServiceError> {
        let existing = self
            .orders
            .get_by_id(id)
            .await?
            .map(|view| view.order)
            .filter(|order| order.is_visible_to(caller))
            .ok_or(ServiceError::NotFound("order"))?;

        let not_cancellable = || ServiceError::bad_request(NOT_CANCELLABLE);
        if !existing.status.is_cancellable() {
            return Err(not_cancellable());
        }

        let notes = append_reason(existing.notes.as_deref(), reason);
        let order = self
            .orders
            .cancel(id, notes.as_deref())
            .await?
            .ok_or_else(not_cancellable)?;

        tracing::info!(order_id = %id, cancelled_by = %caller.id, "Order cancelled");
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<OrderStats, ServiceError> {
        Ok(self.orders.stats(from, to).await?)
    }
}

const NOT_CANCELLABLE: &str = "only pending or paid orders can be cancelled";

fn append_reason(notes: Option<&str>, reason: Option<&str>) -> Option<String> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    match (notes, reason) {
        (Some(notes), Some(reason)) => Some(format!("{notes}\nCancellation reason: {reason}")),
        (None, Some(reason)) => Some(format!("Cancellation reason: {reason}")),
        (notes, None) => notes.map(String::from),
    }
}
