//! Shipment endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promoweb_core::Shipment;

use crate::error::ApiResult;
use crate::services::shipment_service::{
    CreateShipmentRequest, ShipmentService, TrackingEventRequest, UpdateShipmentStatusRequest,
};
use crate::AppState;

/// POST /shipments
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateShipmentRequest>,
) -> ApiResult<(StatusCode, Json<Shipment>)> {
    let shipment = ShipmentService::new(state).create(req).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// GET /shipments/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(ShipmentService::new(state).get(&id).await?))
}

/// PATCH /shipments/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateShipmentStatusRequest>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(ShipmentService::new(state).update_status(&id, req).await?))
}

/// POST /shipments/{id}/tracking-event
pub async fn add_tracking_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TrackingEventRequest>,
) -> ApiResult<(StatusCode, Json<Shipment>)> {
    let shipment = ShipmentService::new(state).add_tracking_event(&id, req).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// GET /shipments/track/{tracking_number}
pub async fn track(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(ShipmentService::new(state).track(&tracking_number).await?))
}
