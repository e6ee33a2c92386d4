use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, OrderDetails, OrderId, OrderStatus, Product, ProductId, User, UserId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderStore, ProductCatalog, UserDirectory, validate_order_for_create},
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    /// Kept in insertion order.
    orders: Vec<Order>,
    fail_writes: bool,
}

/// In-memory store implementation for tests and local runs.
///
/// Mirrors the PostgreSQL store's contract, including all-or-nothing order
/// creation and the referential checks a foreign key would perform.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Adds or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        self.state.write().await.products.insert(product.id, product);
    }

    /// Changes a product's catalog price.
    pub async fn set_product_price(&self, product_id: ProductId, price: common::Money) -> bool {
        match self.state.write().await.products.get_mut(&product_id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Makes every subsequent write fail with [`StoreError::Unavailable`].
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored order items across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .iter()
            .map(|o| o.items.len())
            .sum()
    }

    fn check_writable(state: &State) -> Result<()> {
        if state.fail_writes {
            return Err(StoreError::Unavailable(
                "in-memory store configured to fail writes".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        validate_order_for_create(order)?;

        // Everything is checked under one write lock before the order becomes
        // visible, so a rejected order leaves no rows behind.
        let mut state = self.state.write().await;
        Self::check_writable(&state)?;

        if state.orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::InvalidOrder(format!(
                "order {} already exists",
                order.id
            )));
        }
        if !state.users.contains_key(&order.user_id) {
            return Err(StoreError::MissingReference {
                entity: "user",
                id: order.user_id.to_string(),
            });
        }
        if let Some(item) = order
            .items
            .iter()
            .find(|item| !state.products.contains_key(&item.product_id))
        {
            return Err(StoreError::MissingReference {
                entity: "product",
                id: item.product_id.to_string(),
            });
        }

        state.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        Self::check_writable(&state)?;

        match state.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => {
                order.status = status;
                order.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn transition_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        Self::check_writable(&state)?;

        match state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.status == from)
        {
            Some(order) => {
                order.status = to;
                order.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn load_order_details(&self, order_id: OrderId) -> Result<Option<OrderDetails>> {
        let state = self.state.read().await;
        let Some(order) = state.orders.iter().find(|o| o.id == order_id).cloned() else {
            return Ok(None);
        };

        let user = state.users.get(&order.user_id).cloned();
        let mut products: Vec<Product> = Vec::new();
        for item in &order.items {
            if products.iter().any(|p| p.id == item.product_id) {
                continue;
            }
            if let Some(product) = state.products.get(&item.product_id) {
                products.push(product.clone());
            }
        }

        Ok(Some(OrderDetails {
            order,
            user,
            products,
        }))
    }
}
