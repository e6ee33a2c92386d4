//! Order status transitions and who may trigger them.
//!
//! ```text
//! Pending ──┬──► Completed
//!           ├──► Shipped
//!           └──► Canceled
//! ```
//!
//! Cancel is the only transition gated on the current status. An admin status
//! update may set any of the four recognized values.
//!
//! These are pure checks; persisting the outcome is the caller's job.

use common::{Order, OrderStatus};

use super::OrderError;
use crate::actor::Actor;

/// Checks that `actor` may cancel `order`, returning the status to store.
///
/// The status is checked first: a non-pending order is an invalid transition
/// for every actor, and only a pending order goes on to the ownership check.
pub fn authorize_cancel(actor: &Actor, order: &Order) -> Result<OrderStatus, OrderError> {
    if !order.status.can_cancel() {
        return Err(OrderError::InvalidTransition {
            current: order.status,
            action: "cancel",
        });
    }

    authorize_owner_or_admin(actor, order, "cancel")?;
    Ok(OrderStatus::Canceled)
}

/// Parses a requested status value against the recognized set.
pub fn parse_requested_status(raw: &str) -> Result<OrderStatus, OrderError> {
    Ok(raw.parse::<OrderStatus>()?)
}

/// Checks that `actor` may set an order's status directly.
pub fn authorize_status_update(actor: &Actor) -> Result<(), OrderError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(OrderError::Forbidden {
            action: "update the status of",
        })
    }
}

/// Checks that `actor` may read `order`.
pub fn authorize_view(actor: &Actor, order: &Order) -> Result<(), OrderError> {
    authorize_owner_or_admin(actor, order, "view")
}

fn authorize_owner_or_admin(
    actor: &Actor,
    order: &Order,
    action: &'static str,
) -> Result<(), OrderError> {
    // No role means no access, even to one's own orders.
    let Some(role) = actor.role else {
        return Err(OrderError::Forbidden { action });
    };

    if role.is_admin() || order.is_owned_by(actor.user_id) {
        Ok(())
    } else {
        Err(OrderError::Forbidden { action })
    }
}
