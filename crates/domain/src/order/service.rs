//! Order service providing the workflow API used by the HTTP layer.

use std::time::Instant;

use chrono::Utc;
use common::OrderId;
use store::ShopStore;

use super::transitions;
use super::{LineRequest, OrderBuilder, OrderError, OrderQuery, OrderSummary, OrderView};
use crate::actor::Actor;
use crate::error::DomainError;

/// Service for placing and managing orders.
///
/// The store is injected at construction; the service holds no other state.
#[derive(Clone)]
pub struct OrderService<S: ShopStore> {
    store: S,
    builder: OrderBuilder<S>,
    query: OrderQuery<S>,
}

impl<S: ShopStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            builder: OrderBuilder::new(store.clone()),
            query: OrderQuery::new(store.clone()),
            store,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the actor from the requested lines.
    #[tracing::instrument(skip(self, lines), fields(user_id = %actor.user_id))]
    pub async fn place_order(
        &self,
        actor: &Actor,
        lines: &[LineRequest],
    ) -> Result<OrderSummary, DomainError> {
        let started = Instant::now();

        let order = match self.builder.place(actor.user_id, lines).await {
            Ok(order) => order,
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => reason(&err)).increment(1);
                return Err(err);
            }
        };

        let summary = self
            .query
            .summarize_created(&[order.id])
            .await?
            .into_iter()
            .next()
            .ok_or(OrderError::AssemblyEmpty)?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_place_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(summary)
    }

    /// Lists the actor's own orders, oldest first.
    ///
    /// An empty list means the user has no orders; a missing user is an error.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<OrderView>, DomainError> {
        if self.store.find_user(actor.user_id).await?.is_none() {
            return Err(OrderError::UserNotFound(actor.user_id).into());
        }

        self.query.list_for_user(actor.user_id).await
    }

    /// Loads one order with its lines, for its owner or an admin.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn get_order(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<OrderView, DomainError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        transitions::authorize_view(actor, &order)?;

        self.query
            .view(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id).into())
    }

    /// Cancels a pending order on behalf of its owner or an admin.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<OrderSummary, DomainError> {
        let mut order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let target = transitions::authorize_cancel(actor, &order)?;
        let now = Utc::now();

        let applied = self
            .store
            .transition_status(order_id, order.status, target, now)
            .await?;

        if !applied {
            // The status moved between load and write; report what it is now.
            let current = self
                .store
                .find_order(order_id)
                .await?
                .ok_or(OrderError::OrderNotFound(order_id))?;
            return Err(OrderError::InvalidTransition {
                current: current.status,
                action: "cancel",
            }
            .into());
        }

        order.status = target;
        order.updated_at = now;
        metrics::counter!("order_status_changes_total", "status" => target.as_str()).increment(1);
        tracing::info!(%order_id, "order canceled");
        Ok(OrderSummary::from(&order))
    }

    /// Sets an order's status. Admin only.
    ///
    /// The requested value is checked against the recognized set before
    /// anything else, so an unknown status is rejected for every actor.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        requested: &str,
    ) -> Result<OrderSummary, DomainError> {
        let status = transitions::parse_requested_status(requested)?;
        transitions::authorize_status_update(actor)?;

        let mut order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let now = Utc::now();
        if !self.store.update_status(order_id, status, now).await? {
            return Err(OrderError::OrderNotFound(order_id).into());
        }

        tracing::info!(%order_id, from = %order.status, to = %status, "order status updated");
        order.status = status;
        order.updated_at = now;
        metrics::counter!("order_status_changes_total", "status" => status.as_str()).increment(1);
        Ok(OrderSummary::from(&order))
    }
}

fn reason(err: &DomainError) -> &'static str {
    match err {
        DomainError::Store(_) => "store",
        DomainError::Order(OrderError::NoItems | OrderError::InvalidQuantity { .. }) => {
            "invalid_request"
        }
        DomainError::Order(OrderError::UserNotFound(_)) => "user_not_found",
        DomainError::Order(OrderError::ProductNotFound { .. }) => "product_not_found",
        DomainError::Order(OrderError::PriceOverflow { .. }) => "price_overflow",
        DomainError::Order(_) => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, OrderStatus, Product, ProductId, Role, User, UserId};
    use store::InMemoryStore;

    async fn setup() -> (OrderService<InMemoryStore>, Actor, Product) {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        store
            .insert_user(User {
                id: user_id,
                role: Role::User,
                fullname: "Buyer".to_string(),
                username: "buyer".to_string(),
                email: "buyer@example.com".to_string(),
                telephone: None,
                password_hash: String::new(),
            })
            .await;
        let product = Product {
            id: ProductId::new(),
            name: "Widget".to_string(),
            description: String::new(),
            price: Money::from_cents(1000),
            stock: 5,
        };
        store.insert_product(product.clone()).await;
        (OrderService::new(store), Actor::user(user_id), product)
    }

    #[tokio::test]
    async fn place_then_cancel() {
        let (service, actor, product) = setup().await;

        let summary = service
            .place_order(&actor, &[LineRequest::new(product.id, 2)])
            .await
            .unwrap();
        assert_eq!(summary.total_price, Money::from_cents(2000));
        assert_eq!(summary.status, OrderStatus::Pending);

        let canceled = service.cancel_order(&actor, summary.order_id).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_value_before_role_check() {
        let (service, actor, _) = setup().await;
        let err = service
            .update_status(&actor, OrderId::new(), "Lost")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Order(OrderError::InvalidStatus(_))));
    }

    #[tokio::test]
    async fn list_orders_for_unknown_user_fails() {
        let (service, _, _) = setup().await;
        let err = service
            .list_orders(&Actor::user(UserId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Order(OrderError::UserNotFound(_))));
    }
}
