//! Order repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{OrderId, OrderStatus, PageRequest, PaymentMethod, Price, UserId};

use super::RepositoryError;
use crate::models::order::{
    GuestInfo, NewOrder, Order, OrderFilter, OrderItem, OrderStats, OrderView, PaymentInfo,
    ShippingAddress,
};
use crate::models::user::UserSummary;

/// Selects an order joined with its owner; expects the order aliased as `o`.
const VIEW_COLUMNS: &str = "o.id, o.user_id, o.is_guest, o.guest_info, o.items, o.total_amount, \
     o.status, o.payment_method, o.payment_info, o.shipping_address, o.notes, \
     o.tracking_number, o.created_at, o.updated_at, \
     u.name AS customer_name, u.email AS customer_email, u.phone AS customer_phone";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderViewRow {
    id: i32,
    user_id: Option<i32>,
    is_guest: bool,
    guest_info: Option<Json<GuestInfo>>,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_info: Json<PaymentInfo>,
    shipping_address: Json<ShippingAddress>,
    notes: Option<String>,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
}

impl TryFrom<OrderViewRow> for OrderView {
    type Error = RepositoryError;

    fn try_from(row: OrderViewRow) -> Result<Self, Self::Error> {
        let total_amount = Price::new(row.total_amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for order {}: {e}", row.id))
        })?;

        let user_id = row.user_id.map(UserId::new);
        let user = match (user_id, row.customer_name, row.customer_email) {
            (Some(id), Some(name), Some(email)) => Some(UserSummary {
                id,
                name,
                email,
                phone: row.customer_phone,
            }),
            _ => None,
        };

        let order = Order {
            id: OrderId::new(row.id),
            user_id,
            is_guest: row.is_guest,
            guest_info: row.guest_info.map(|Json(info)| info),
            items: row.items.0,
            total_amount,
            status: row.status,
            payment_method: row.payment_method,
            payment_info: row.payment_info.0,
            shipping_address: row.shipping_address.0,
            notes: row.notes,
            tracking_number: row.tracking_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok(Self::new(order, user))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderStatsRow {
    total_orders: i64,
    total_revenue: Decimal,
    pending_orders: i64,
    paid_orders: i64,
    processing_orders: i64,
    shipped_orders: i64,
    delivered_orders: i64,
    cancelled_orders: i64,
}

impl TryFrom<OrderStatsRow> for OrderStats {
    type Error = RepositoryError;

    fn try_from(row: OrderStatsRow) -> Result<Self, Self::Error> {
        let total_revenue = Price::new(row.total_revenue)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid revenue total: {e}")))?;

        Ok(Self {
            total_orders: row.total_orders,
            total_revenue,
            pending_orders: row.pending_orders,
            paid_orders: row.paid_orders,
            processing_orders: row.processing_orders,
            shipped_orders: row.shipped_orders,
            delivered_orders: row.delivered_orders,
            cancelled_orders: row.cancelled_orders,
        })
    }
}

fn collect_views(rows: Vec<OrderViewRow>) -> Result<Vec<OrderView>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

fn push_date_range(
    qb: &mut QueryBuilder<'_, Postgres>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) {
    if let Some(from) = from {
        qb.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(to) = to {
        qb.push(" AND o.created_at <= ").push_bind(to);
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(method) = filter.payment_method {
        qb.push(" AND o.payment_method = ").push_bind(method);
    }
    push_date_range(qb, filter.date_from, filter.date_to);
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order and return it joined with its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderView, RepositoryError> {
        let row = sqlx::query_as::<_, OrderViewRow>(&format!(
            r"
            WITH o AS (
                INSERT INTO orders (
                    user_id, is_guest, guest_info, items, total_amount,
                    payment_method, shipping_address, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT {VIEW_COLUMNS} FROM o LEFT JOIN users u ON u.id = o.user_id
            "
        ))
        .bind(order.user_id)
        .bind(order.user_id.is_none())
        .bind(order.guest_info.as_ref().map(Json))
        .bind(Json(&order.items))
        .bind(order.total_amount.amount())
        .bind(order.payment_method)
        .bind(Json(&order.shipping_address))
        .bind(&order.notes)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<OrderView>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderViewRow>(&format!(
            "SELECT {VIEW_COLUMNS} FROM orders o LEFT JOIN users u ON u.id = o.user_id WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// One page of orders matching `filter`, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<OrderView>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {VIEW_COLUMNS} FROM orders o LEFT JOIN users u ON u.id = o.user_id"
        ));
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = page_query
            .build_query_as::<OrderViewRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((collect_views(rows)?, total))
    }

    /// One page of a user's orders, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<OrderView>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderViewRow>(&format!(
            r"
            SELECT {VIEW_COLUMNS} FROM orders o LEFT JOIN users u ON u.id = o.user_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((collect_views(rows)?, total))
    }

    /// Persist a new status together with the payment details and tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        payment_info: &PaymentInfo,
        tracking_number: Option<&str>,
    ) -> Result<OrderView, RepositoryError> {
        let row = sqlx::query_as::<_, OrderViewRow>(&format!(
            r"
            WITH o AS (
                UPDATE orders SET
                    status          = $2,
                    payment_info    = $3,
                    tracking_number = COALESCE($4, tracking_number),
                    updated_at      = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {VIEW_COLUMNS} FROM o LEFT JOIN users u ON u.id = o.user_id
            "
        ))
        .bind(id)
        .bind(status)
        .bind(Json(payment_info))
        .bind(tracking_number)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Mark an order cancelled if it is still pending or paid.
    ///
    /// Returns `Ok(None)` when the order exists but has moved past the
    /// cancellable states.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn cancel(
        &self,
        id: OrderId,
        notes: Option<&str>,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderViewRow>(&format!(
            r"
            WITH o AS (
                UPDATE orders SET
                    status     = 'cancelled',
                    notes      = $2,
                    updated_at = now()
                WHERE id = $1 AND status IN ('pending', 'paid')
                RETURNING *
            )
            SELECT {VIEW_COLUMNS} FROM o LEFT JOIN users u ON u.id = o.user_id
            "
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Totals and per-status counts over an optional creation-date range.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<OrderStats, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(o.total_amount), 0) AS total_revenue,
                COUNT(*) FILTER (WHERE o.status = 'pending') AS pending_orders,
                COUNT(*) FILTER (WHERE o.status = 'paid') AS paid_orders,
                COUNT(*) FILTER (WHERE o.status = 'processing') AS processing_orders,
                COUNT(*) FILTER (WHERE o.status = 'shipped') AS shipped_orders,
                COUNT(*) FILTER (WHERE o.status = 'delivered') AS delivered_orders,
                COUNT(*) FILTER (WHERE o.status = 'cancelled') AS cancelled_orders
            FROM orders o
            WHERE TRUE",
        );
        push_date_range(&mut qb, from, to);

        let row = qb
            .build_query_as::<OrderStatsRow>()
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }
}
