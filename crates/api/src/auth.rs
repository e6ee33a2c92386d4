//! Caller identity extraction.
//!
//! The authenticated user is carried in request headers set by the
//! authentication front: `x-user-id` holds the user UUID and
//! `x-user-role` the role name. A missing or unknown role yields an
//! actor without a role, which every ownership check rejects.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Role, UserId};
use domain::Actor;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The actor making the current request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let user_id: UserId = raw_id
            .trim()
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<Role>().ok());

        if role.is_none() {
            tracing::debug!(%user_id, "request carries no recognized role");
        }

        Ok(CurrentActor(Actor::new(user_id, role)))
    }
}
