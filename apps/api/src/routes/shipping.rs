//! Shipping zone endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use promoweb_core::ShippingZone;

use crate::error::ApiResult;
use crate::services::shipping_service::{EstimateRequest, ShippingEstimate, ShippingService};
use crate::AppState;

/// GET /shipping/zones
pub async fn zones(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ShippingZone>>> {
    Ok(Json(ShippingService::new(state).list_zones().await?))
}

/// POST /shipping/estimate
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> ApiResult<Json<ShippingEstimate>> {
    Ok(Json(ShippingService::new(state).estimate(req).await?))
}
