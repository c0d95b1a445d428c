//! Payment endpoints. Every create endpoint except cash on delivery also runs
//! the gateway round trip.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promoweb_core::Payment;

use crate::error::ApiResult;
use crate::services::payment_service::{
    CardPaymentRequest, CashOnDeliveryRequest, CreatePaymentRequest, MobileMoneyPaymentRequest,
    PaymentService, RefundRequest,
};
use crate::AppState;

/// POST /payments
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state).create_and_process(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /payments/mobile-money
pub async fn mobile_money(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MobileMoneyPaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state).create_mobile_money(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /payments/card
pub async fn card(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CardPaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state).create_card(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /payments/cash-on-delivery
///
/// The payment stays `pending` until the courier's collection is recorded.
pub async fn cash_on_delivery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CashOnDeliveryRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state).create_cash_on_delivery(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /payments/{id}/collect
pub async fn collect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(PaymentService::new(state).collect(&id).await?))
}

/// GET /payments/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(PaymentService::new(state).get(&id).await?))
}

/// POST /payments/{id}/refund
///
/// Body `{ "amountXaf": n, "reason": "..." }` is optional; without an amount
/// the rest is refunded.
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    req: Option<Json<RefundRequest>>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let refund = PaymentService::new(state).refund(&id, req).await?;
    Ok((StatusCode::CREATED, Json(refund)))
}
