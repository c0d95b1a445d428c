//! Order endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use promoweb_core::{Order, OrderDetails};

use crate::error::ApiResult;
use crate::services::order_service::{
    CancelOrderRequest, CreateOrderRequest, ListOrdersQuery, OrderPage, OrderService,
    UpdatePaymentStatusRequest, UpdateStatusRequest,
};
use crate::AppState;

/// POST /orders
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetails>)> {
    let details = OrderService::new(state).create(req).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// GET /orders?status=&limit=&offset=
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<OrderPage>> {
    Ok(Json(OrderService::new(state).list(query).await?))
}

/// GET /orders/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(OrderService::new(state).get(&id).await?))
}

/// GET /orders/number/{order_number}
pub async fn get_by_number(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(OrderService::new(state).get_by_number(&order_number).await?))
}

/// PATCH /orders/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(OrderService::new(state).update_status(&id, req).await?))
}

/// PATCH /orders/{id}/payment-status
pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(
        OrderService::new(state).update_payment_status(&id, req).await?,
    ))
}

/// PATCH /orders/{id}/cancel
///
/// The body is optional; an empty body cancels without a reason.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    req: Option<Json<CancelOrderRequest>>,
) -> ApiResult<Json<Order>> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(OrderService::new(state).cancel(&id, req).await?))
}
