//! Order domain types.
//!
//! Line items, guest details, payment details and the shipping address are
//! stored as JSONB documents on the order row. Line items are snapshots taken
//! at checkout; later product edits never reach historical orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};

use super::user::{User, UserSummary};

/// A frozen copy of a product at the moment it was ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Contact details recorded for orders placed without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ShippingAddress {
    /// Guest contact details derived from the recipient.
    #[must_use]
    pub fn guest_info(&self) -> GuestInfo {
        GuestInfo {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PaymentInfo {
    /// Overlay the fields present in `update` onto `self`.
    pub fn merge(&mut self, update: Self) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.bank_name, update.bank_name);
        take(&mut self.account_number, update.account_number);
        take(&mut self.account_name, update.account_name);
        take(&mut self.transaction_id, update.transaction_id);
        take(&mut self.payment_date, update.payment_date);
        take(&mut self.notes, update.notes);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub is_guest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_info: Option<GuestInfo>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_info: PaymentInfo,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of item quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    /// Admins see every order; customers only their own. Callers that fail
    /// this check get the same answer as for a missing order.
    #[must_use]
    pub fn is_visible_to(&self, caller: &User) -> bool {
        caller.is_admin() || self.is_owned_by(caller.id)
    }
}

/// An order as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub total_items: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: Order, user: Option<UserSummary>) -> Self {
        let total_items = order.total_items();
        Self {
            order,
            total_items,
            user,
        }
    }
}

/// Insert payload for a validated order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub guest_info: Option<GuestInfo>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

/// Filters for the administrator order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Aggregate order figures over an optional date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_revenue: Price,
    pub pending_orders: i64,
    pub paid_orders: i64,
    pub processing_orders: i64,
    pub shipped_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(quantity: u32, cents: i64) -> OrderItem {
        OrderItem {
            product: ProductId::new(1),
            name: "Widget".to_string(),
            price: Price::new(Decimal::new(cents, 2)).unwrap(),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(3, 250).line_total().amount(), Decimal::new(750, 2));
    }

    #[test]
    fn test_payment_info_merge_keeps_existing_fields() {
        let mut info = PaymentInfo {
            bank_name: Some("ACB".to_string()),
            notes: Some("first".to_string()),
            ..PaymentInfo::default()
        };
        info.merge(PaymentInfo {
            transaction_id: Some("TX-1".to_string()),
            notes: Some("second".to_string()),
            ..PaymentInfo::default()
        });
        assert_eq!(info.bank_name.as_deref(), Some("ACB"));
        assert_eq!(info.transaction_id.as_deref(), Some("TX-1"));
        assert_eq!(info.notes.as_deref(), Some("second"));
    }

    #[test]
    fn test_guest_info_from_shipping_address() {
        let address = ShippingAddress {
            name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            address: "12 Hang Bac".to_string(),
            city: None,
            district: None,
            ward: None,
            email: Some("lan@example.com".to_string()),
        };
        let guest = address.guest_info();
        assert_eq!(guest.name, "Lan");
        assert_eq!(guest.email.as_deref(), Some("lan@example.com"));
        assert_eq!(guest.phone, "0901234567");
    }

    fn user(id: i32, role: bazaar_core::UserRole) -> User {
        User {
            id: UserId::new(id),
            name: "Shopper".to_string(),
            email: bazaar_core::Email::parse("shopper@example.com").unwrap(),
            role,
            phone: None,
            address: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_visibility() {
        let address = ShippingAddress {
            name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            address: "12 Hang Bac".to_string(),
            city: None,
            district: None,
            ward: None,
            email: None,
        };
        let order = Order {
            id: OrderId::new(1),
            user_id: Some(UserId::new(7)),
            is_guest: false,
            guest_info: None,
            items: vec![item(1, 100)],
            total_amount: Price::new(Decimal::new(100, 2)).unwrap(),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::BankTransfer,
            payment_info: PaymentInfo::default(),
            shipping_address: address,
            notes: None,
            tracking_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(order.is_visible_to(&user(7, bazaar_core::UserRole::Customer)));
        assert!(order.is_visible_to(&user(1, bazaar_core::UserRole::Admin)));
        assert!(!order.is_visible_to(&user(8, bazaar_core::UserRole::Customer)));
    }

    #[test]
    fn test_order_item_json_shape() {
        let json = serde_json::to_value(item(2, 1999)).unwrap();
        assert_eq!(json["product"], 1);
        assert_eq!(json["price"], "19.99");
        assert!(json.get("image").is_none());
    }
}
