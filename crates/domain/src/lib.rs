//! Domain layer for the shop backend.
//!
//! This crate holds the order workflow:
//! - [`OrderBuilder`] turns a cart of line requests into a priced, persisted order
//! - [`transitions`] decides which status changes an actor may perform
//! - [`OrderQuery`] reloads orders and shapes them for responses
//! - [`OrderService`] sequences the above for the HTTP layer

pub mod actor;
pub mod error;
pub mod order;

pub use actor::Actor;
pub use error::{DomainError, ErrorKind};
pub use order::{
    LineRequest, OrderBuilder, OrderError, OrderItemView, OrderQuery, OrderService, OrderSummary,
    OrderView, transitions,
};
