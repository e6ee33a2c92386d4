//! Builds priced orders from requested lines.

use chrono::Utc;
use common::{Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, ProductId, UserId};
use serde::Deserialize;
use store::{OrderStore, ProductCatalog, UserDirectory};

use super::OrderError;
use crate::error::DomainError;

/// One requested line of an order.
///
/// `quantity` is signed so that zero and negative values reach validation
/// instead of failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Validates requested lines, returning the quantities as unsigned values.
pub fn validate_lines(lines: &[LineRequest]) -> Result<Vec<(ProductId, u32)>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::NoItems);
    }

    lines
        .iter()
        .enumerate()
        .map(|(line, req)| {
            u32::try_from(req.quantity)
                .ok()
                .filter(|q| *q > 0)
                .map(|q| (req.product_id, q))
                .ok_or(OrderError::InvalidQuantity {
                    line,
                    quantity: req.quantity,
                })
        })
        .collect()
}

/// Prices resolved lines for `order_id`.
///
/// Each item freezes the product's current price. The total is accumulated
/// left to right over the input order.
pub fn price_lines(
    order_id: OrderId,
    lines: &[(Product, u32)],
) -> Result<(Vec<OrderItem>, Money), OrderError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for (line, (product, quantity)) in lines.iter().enumerate() {
        if product.price.is_negative() {
            return Err(OrderError::InvalidPrice {
                product_id: product.id,
            });
        }

        let line_total = product
            .price
            .checked_mul(*quantity)
            .ok_or(OrderError::PriceOverflow { line })?;
        total = total
            .checked_add(line_total)
            .ok_or(OrderError::PriceOverflow { line })?;

        items.push(OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: product.id,
            quantity: *quantity,
            unit_price: product.price,
            total_price: line_total,
        });
    }

    Ok((items, total))
}

/// Assembles pending orders from a user's cart.
///
/// Building is all-or-nothing: a single bad line aborts the whole order and
/// nothing is written.
#[derive(Clone)]
pub struct OrderBuilder<S> {
    store: S,
}

impl<S> OrderBuilder<S>
where
    S: ProductCatalog + UserDirectory + OrderStore,
{
    /// Creates a new builder backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates the request and prices it, without persisting anything.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn build(&self, user_id: UserId, lines: &[LineRequest]) -> Result<Order, DomainError> {
        let requested = validate_lines(lines)?;

        if self.store.find_user(user_id).await?.is_none() {
            return Err(OrderError::UserNotFound(user_id).into());
        }

        // Prices are read as committed snapshots, outside the write
        // transaction, so concurrent builds never block on a product row.
        // A product removed before commit fails the item foreign key in
        // `create_order`, which rolls the whole order back.
        let mut resolved = Vec::with_capacity(requested.len());
        for (line, (product_id, quantity)) in requested.into_iter().enumerate() {
            let product = self
                .store
                .find_product(product_id)
                .await?
                .ok_or(OrderError::ProductNotFound { line, product_id })?;
            resolved.push((product, quantity));
        }

        let order_id = OrderId::new();
        let (items, total_price) = price_lines(order_id, &resolved)?;
        let now = Utc::now();

        Ok(Order {
            id: order_id,
            user_id,
            total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items,
        })
    }

    /// Builds the order and persists it with all of its items in one unit.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn place(&self, user_id: UserId, lines: &[LineRequest]) -> Result<Order, DomainError> {
        let order = self.build(user_id, lines).await?;
        self.store.create_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            %user_id,
            total = %order.total_price,
            items = order.items.len(),
            "order placed"
        );
        Ok(order)
    }
}
