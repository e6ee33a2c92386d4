//! Order workflow and related types.

mod builder;
mod query;
mod service;
pub mod transitions;

pub use builder::{LineRequest, OrderBuilder, price_lines, validate_lines};
pub use query::{OrderItemView, OrderQuery, OrderSummary, OrderView};
pub use service::OrderService;

use common::{OrderId, OrderStatus, ProductId, UserId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Business rule failures of the order workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity on a requested line.
    #[error("Invalid quantity on line {line}: {quantity} (must be a positive integer)")]
    InvalidQuantity { line: usize, quantity: i64 },

    /// A line or order total does not fit in the money representation.
    #[error("Price overflow on line {line}")]
    PriceOverflow { line: usize },

    /// The requested status is not one of the recognized values.
    #[error("{0}")]
    InvalidStatus(#[from] common::ParseStatusError),

    /// The acting user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// A requested product does not exist.
    #[error("Product not found on line {line}: {product_id}")]
    ProductNotFound { line: usize, product_id: ProductId },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The actor may not perform this action on the order.
    #[error("Access denied: you cannot {action} this order")]
    Forbidden { action: &'static str },

    /// The order's status does not allow the action.
    #[error("Cannot {action} an order in {current} status; only pending orders can be canceled")]
    InvalidTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// A catalog price is negative.
    #[error("Product {product_id} has a negative price")]
    InvalidPrice { product_id: ProductId },

    /// None of the freshly created orders could be reloaded.
    #[error("No orders could be assembled after creation")]
    AssemblyEmpty,
}

impl OrderError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::PriceOverflow { .. }
            | OrderError::InvalidStatus(_) => ErrorKind::Validation,
            OrderError::UserNotFound(_)
            | OrderError::ProductNotFound { .. }
            | OrderError::OrderNotFound(_) => ErrorKind::NotFound,
            OrderError::Forbidden { .. } => ErrorKind::Forbidden,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::InvalidPrice { .. } | OrderError::AssemblyEmpty => ErrorKind::Internal,
        }
    }
}
