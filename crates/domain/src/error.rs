//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A business rule rejected the operation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),
}

/// Coarse classification used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A referenced user, product or order does not exist.
    NotFound,
    /// The actor's role or ownership does not permit the operation.
    Forbidden,
    /// The order's status does not allow the requested change.
    InvalidTransition,
    /// Store failure or broken invariant.
    Internal,
}

impl DomainError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Store(_) => ErrorKind::Internal,
            DomainError::Order(err) => err.kind(),
        }
    }
}
