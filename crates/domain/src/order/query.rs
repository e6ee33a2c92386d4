//! Reloads orders and shapes them for responses.

use chrono::{DateTime, SecondsFormat, Utc};
use common::{Money, Order, OrderDetails, OrderId, OrderStatus, ProductId, UserId};
use futures_util::future::try_join_all;
use serde::Serialize;
use store::OrderStore;

use super::OrderError;
use crate::error::DomainError;

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The compact projection returned after placing or changing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_price: Money,
    pub status: OrderStatus,
    /// RFC 3339, second precision.
    pub created_at: String,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            total_price: order.total_price,
            status: order.status,
            created_at: format_timestamp(order.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemView {
    pub product_id: ProductId,
    /// Absent when the product has since been removed from the catalog.
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// The full projection of an order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemView>,
}

impl From<&OrderDetails> for OrderView {
    fn from(details: &OrderDetails) -> Self {
        let order = &details.order;
        let items = order
            .items
            .iter()
            .map(|item| OrderItemView {
                product_id: item.product_id,
                product_name: details.product(item.product_id).map(|p| p.name.clone()),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
            })
            .collect();

        Self {
            order_id: order.id,
            user_id: order.user_id,
            username: details.user.as_ref().map(|u| u.username.clone()),
            total_price: order.total_price,
            status: order.status,
            created_at: format_timestamp(order.created_at),
            updated_at: format_timestamp(order.updated_at),
            items,
        }
    }
}

/// Read side of the order workflow.
#[derive(Clone)]
pub struct OrderQuery<S> {
    store: S,
}

impl<S: OrderStore> OrderQuery<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the full view of one order, or `None` if it does not exist.
    pub async fn view(&self, order_id: OrderId) -> Result<Option<OrderView>, DomainError> {
        let details = self.store.load_order_details(order_id).await?;
        Ok(details.as_ref().map(OrderView::from))
    }

    /// Reloads freshly created orders and summarizes the ones that came back.
    ///
    /// Orders whose reload finds nothing are skipped. If none survive, the
    /// batch fails with [`OrderError::AssemblyEmpty`].
    #[tracing::instrument(skip(self, order_ids), fields(orders = order_ids.len()))]
    pub async fn summarize_created(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderSummary>, DomainError> {
        let reloaded = try_join_all(
            order_ids
                .iter()
                .map(|id| self.store.load_order_details(*id)),
        )
        .await?;

        let mut summaries = Vec::with_capacity(reloaded.len());
        for (id, details) in order_ids.iter().zip(reloaded) {
            match details {
                Some(details) => summaries.push(OrderSummary::from(&details.order)),
                None => tracing::warn!(order_id = %id, "created order not visible on reload"),
            }
        }

        if summaries.is_empty() {
            return Err(OrderError::AssemblyEmpty.into());
        }
        Ok(summaries)
    }

    /// Lists a user's orders with their lines, oldest first.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderView>, DomainError> {
        let orders = self.store.list_orders_for_user(user_id).await?;
        let details = try_join_all(
            orders
                .iter()
                .map(|order| self.store.load_order_details(order.id)),
        )
        .await?;

        // An order deleted between the two reads is simply left out.
        Ok(details.iter().flatten().map(OrderView::from).collect())
    }
}
