//! Order placement, lookup, and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{DomainError, LineRequest, OrderError, OrderService, OrderSummary, OrderView};
use serde::Deserialize;
use store::ShopStore;

use crate::auth::CurrentActor;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ShopStore> {
    pub order_service: OrderService<S>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<LineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Handlers --

/// POST /user/place/order: place an order for the calling user.
#[tracing::instrument(skip(state, payload))]
pub async fn place<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<OrderSummary>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let summary = state.order_service.place_order(&actor, &req.items).await?;
    Ok(Json(summary))
}

/// GET /user/orders: list the calling user's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.order_service.list_orders(&actor).await?;
    Ok(Json(orders))
}

/// GET /orders/{order_id}: one order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(order_id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let view = state.order_service.get_order(&actor, order_id).await?;
    Ok(Json(view))
}

/// PATCH /cancel/order/{order_id}: cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(order_id): Path<String>,
) -> Result<Json<OrderSummary>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let summary = state.order_service.cancel_order(&actor, order_id).await?;
    Ok(Json(summary))
}

/// PATCH /update/order/{order_id}: set an order's status (admin only).
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(order_id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderSummary>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let summary = state
        .order_service
        .update_status(&actor, order_id, &req.status)
        .await
        .map_err(|err| match err {
            // An unknown id here is a bad target, not a missing resource.
            DomainError::Order(OrderError::OrderNotFound(id)) => {
                ApiError::BadRequest(format!("Order not found: {id}"))
            }
            other => other.into(),
        })?;
    Ok(Json(summary))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
