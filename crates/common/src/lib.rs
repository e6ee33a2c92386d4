//! Shared types for the shop backend.
//!
//! Everything here is plain data: identifiers, money, order status, roles and
//! the records the store persists. Behaviour lives in the `domain` crate.

pub mod model;
pub mod money;
pub mod status;
pub mod types;

pub use model::{Order, OrderDetails, OrderItem, Product, User};
pub use money::Money;
pub use status::{OrderStatus, ParseRoleError, ParseStatusError, Role};
pub use types::{OrderId, OrderItemId, ProductId, UserId};
