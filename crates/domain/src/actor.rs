//! The authenticated caller of a domain operation.

use common::{Role, UserId};

/// Identity supplied by the transport layer.
///
/// `role` is `None` when the caller's role could not be established; every
/// authorization check fails for such an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(user_id: UserId, role: Option<Role>) -> Self {
        Self { user_id, role }
    }

    /// An actor with the `User` role.
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Some(Role::User))
    }

    /// An actor with the `Admin` role.
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Some(Role::Admin))
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(|r| r.is_admin())
    }
}
