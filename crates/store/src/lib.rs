//! Storage layer for the shop backend.
//!
//! Each capability the order workflow needs is a trait of its own
//! ([`ProductCatalog`], [`UserDirectory`], [`OrderStore`]). Both
//! [`PostgresStore`] and [`InMemoryStore`] implement all three.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{OrderStore, ProductCatalog, ShopStore, UserDirectory, validate_order_for_create};
