//! Records persisted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};

/// A registered user. Every user has exactly one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub telephone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Current unit price. Orders copy it at build time and never read it again.
    pub price: Money,
    pub stock: i32,
}

/// One product line within an order, carrying its own price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    /// Always `quantity * unit_price`.
    pub total_price: Money,
}

/// An order together with the line items it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Always the sum of the items' `total_price`.
    pub total_price: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns true if `user_id` owns this order.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Sum of the line totals, left to right.
    pub fn items_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total_price))
    }
}

/// An order reloaded with its owning user and the products its items reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub user: Option<User>,
    pub products: Vec<Product>,
}

impl OrderDetails {
    /// Looks up a referenced product by id.
    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order_id: OrderId, quantity: u32, unit_cents: i64) -> OrderItem {
        let unit_price = Money::from_cents(unit_cents);
        OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: ProductId::new(),
            quantity,
            unit_price,
            total_price: unit_price.checked_mul(quantity).unwrap(),
        }
    }

    #[test]
    fn items_total_sums_line_totals() {
        let order_id = OrderId::new();
        let now = Utc::now();
        let order = Order {
            id: order_id,
            user_id: UserId::new(),
            total_price: Money::from_cents(3500),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items: vec![item(order_id, 2, 1000), item(order_id, 3, 500)],
        };
        assert_eq!(order.items_total(), Some(order.total_price));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: UserId::new(),
            role: Role::User,
            fullname: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            telephone: None,
            password_hash: "secret-hash".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "User");
    }
}
