use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was rejected before anything was written.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A referenced row (user or product) does not exist at write time.
    #[error("Missing {entity} referenced by order: {id}")]
    MissingReference { entity: &'static str, id: String },

    /// A stored row could not be decoded into a record.
    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },

    /// The backing store is unreachable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
