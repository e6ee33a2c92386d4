use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, OrderDetails, OrderId, OrderStatus, Product, ProductId, User, UserId};

use crate::{Result, StoreError};

/// Resolves catalog products.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product by id.
    ///
    /// `Ok(None)` means the product does not exist; `Err` is reserved for
    /// failures of the store itself.
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>>;
}

/// Resolves user accounts together with their role.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by id. A user whose role cannot be resolved is reported
    /// as absent.
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
}

/// Persists orders and their line items.
///
/// The store performs no authorization or transition checks; those belong to
/// the domain layer.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order and every one of its items as a single unit.
    ///
    /// Either all rows are written or none are. A future dropped before
    /// completion leaves nothing behind.
    async fn create_order(&self, order: &Order) -> Result<()>;

    /// Loads an order with its items (in line order).
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, oldest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Sets the status unconditionally.
    ///
    /// Returns false if no order with that id exists.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Sets the status only if the order is currently in `from`.
    ///
    /// Returns false if the order does not exist or its status has moved on.
    async fn transition_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Loads an order with its owning user and referenced products.
    ///
    /// `Ok(None)` means the order does not exist.
    async fn load_order_details(&self, order_id: OrderId) -> Result<Option<OrderDetails>>;
}

/// Everything the order workflow needs from a single backing store.
pub trait ShopStore: ProductCatalog + UserDirectory + OrderStore + Clone + 'static {}

impl<T> ShopStore for T where T: ProductCatalog + UserDirectory + OrderStore + Clone + 'static {}

/// Validates an order before it is written.
pub fn validate_order_for_create(order: &Order) -> Result<()> {
    if order.items.is_empty() {
        return Err(StoreError::InvalidOrder(
            "order must contain at least one item".to_string(),
        ));
    }

    for (index, item) in order.items.iter().enumerate() {
        if item.order_id != order.id {
            return Err(StoreError::InvalidOrder(format!(
                "item {index} belongs to order {}, not {}",
                item.order_id, order.id
            )));
        }
        if item.quantity == 0 {
            return Err(StoreError::InvalidOrder(format!(
                "item {index} has zero quantity"
            )));
        }
        if item.unit_price.checked_mul(item.quantity) != Some(item.total_price) {
            return Err(StoreError::InvalidOrder(format!(
                "item {index} total does not equal quantity * unit price"
            )));
        }
    }

    if order.items_total() != Some(order.total_price) {
        return Err(StoreError::InvalidOrder(
            "order total does not equal the sum of its items".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, OrderItem, OrderItemId};

    fn order_with(items: &[(u32, i64)]) -> Order {
        let id = OrderId::new();
        let now = Utc::now();
        let items: Vec<OrderItem> = items
            .iter()
            .map(|&(quantity, cents)| {
                let unit_price = Money::from_cents(cents);
                OrderItem {
                    id: OrderItemId::new(),
                    order_id: id,
                    product_id: ProductId::new(),
                    quantity,
                    unit_price,
                    total_price: unit_price.checked_mul(quantity).unwrap(),
                }
            })
            .collect();
        let total_price = items
            .iter()
            .map(|i| i.total_price)
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
            .unwrap();
        Order {
            id,
            user_id: UserId::new(),
            total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items,
        }
    }

    #[test]
    fn accepts_consistent_order() {
        assert!(validate_order_for_create(&order_with(&[(2, 1000), (3, 500)])).is_ok());
    }

    #[test]
    fn rejects_empty_order() {
        let result = validate_order_for_create(&order_with(&[]));
        assert!(matches!(result, Err(StoreError::InvalidOrder(_))));
    }

    #[test]
    fn rejects_mismatched_total() {
        let mut order = order_with(&[(2, 1000)]);
        order.total_price = Money::from_cents(1);
        let result = validate_order_for_create(&order);
        assert!(matches!(result, Err(StoreError::InvalidOrder(_))));
    }

    #[test]
    fn rejects_item_from_another_order() {
        let mut order = order_with(&[(1, 100)]);
        order.items[0].order_id = OrderId::new();
        let result = validate_order_for_create(&order);
        assert!(matches!(result, Err(StoreError::InvalidOrder(_))));
    }
}
