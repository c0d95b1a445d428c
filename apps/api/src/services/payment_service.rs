//! # Payment Service
//!
//! Payment initiation, gateway processing and refunds.
//!
//! ## Processing
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  tx 1   pending ──► processing        (guarded UPDATE, single winner)     │
//! │                                                                          │
//! │  ....   gateway.authorize()           (no transaction held while waiting) │
//! │                                                                          │
//! │  tx 2   processing ──► completed | failed                                │
//! │         on completed: lock order, re-derive payment_status from scratch  │
//! │                                                                          │
//! │  tx 2 failed   processing ──► failed  (error kept as failure_reason)     │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cash on delivery payments stay `pending` until the courier hands the cash
//! over ([`PaymentService::collect`]); they never reach the gateway.
//!
//! Refunds never touch the gateway: a refund row is `completed` on creation
//! and carries a negative amount.

use std::sync::Arc;

use chrono::Utc;
use promoweb_core::numbering::Sequence;
use promoweb_core::payment::{payment_status_for, refund_amount};
use promoweb_core::validation::{validate_card_last4, validate_phone};
use promoweb_core::{
    CoreError, Money, Order, Payment, PaymentMetadata, PaymentMethod, PaymentStatus, PaymentType,
};
use promoweb_db::repository::{order, payment, sequence};
use promoweb_db::{DbError, DbResult};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::gateway::GatewayDecision;
use crate::services::notifier::Notification;
use crate::AppState;

/// Longest refund reason kept on the refund row.
const MAX_REFUND_REASON_LEN: usize = 500;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub payment_type: PaymentType,
    pub amount_xaf: i64,
    pub method: PaymentMethod,
    pub phone_number: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileMoneyPaymentRequest {
    pub order_id: String,
    pub payment_type: PaymentType,
    pub amount_xaf: i64,
    /// `orange_money` or `mtn_mobile_money`.
    pub provider: PaymentMethod,
    pub phone_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentRequest {
    pub order_id: String,
    pub payment_type: PaymentType,
    pub amount_xaf: i64,
    pub card_last4: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOnDeliveryRequest {
    pub order_id: String,
    pub payment_type: PaymentType,
    pub amount_xaf: i64,
    /// Number the courier calls on arrival.
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub amount_xaf: Option<i64>,
    pub reason: Option<String>,
}

impl From<MobileMoneyPaymentRequest> for CreatePaymentRequest {
    fn from(req: MobileMoneyPaymentRequest) -> Self {
        CreatePaymentRequest {
            order_id: req.order_id,
            payment_type: req.payment_type,
            amount_xaf: req.amount_xaf,
            method: req.provider,
            phone_number: Some(req.phone_number),
            card_last4: None,
        }
    }
}

impl From<CashOnDeliveryRequest> for CreatePaymentRequest {
    fn from(req: CashOnDeliveryRequest) -> Self {
        CreatePaymentRequest {
            order_id: req.order_id,
            payment_type: req.payment_type,
            amount_xaf: req.amount_xaf,
            method: PaymentMethod::CashOnDelivery,
            phone_number: req.phone_number,
            card_last4: None,
        }
    }
}

impl From<CardPaymentRequest> for CreatePaymentRequest {
    fn from(req: CardPaymentRequest) -> Self {
        CreatePaymentRequest {
            order_id: req.order_id,
            payment_type: req.payment_type,
            amount_xaf: req.amount_xaf,
            method: PaymentMethod::Card,
            phone_number: None,
            card_last4: Some(req.card_last4),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// What the second processing transaction managed to save.
enum Recorded {
    /// Outcome saved; carries the order when the payment completed.
    Saved(Option<Order>),
    /// Someone else moved the payment out of `processing` meanwhile.
    NotProcessing,
}

pub struct PaymentService {
    state: Arc<AppState>,
}

impl PaymentService {
    pub fn new(state: Arc<AppState>) -> Self {
        PaymentService { state }
    }

    /// Records a `pending` payment. Amount must match the order for its type.
    pub async fn create(&self, req: CreatePaymentRequest) -> ApiResult<Payment> {
        let metadata = Self::metadata(&req)?;
        let now = Utc::now();

        let mut tx = self.state.db.begin().await?;
        let transaction_id = sequence::next_number(&mut tx, Sequence::Transaction, now).await?;

        let target = order::find_by_id(&mut tx, &req.order_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::OrderNotFound(req.order_id.clone())))?;

        let created = Payment::new_pending(
            &target,
            transaction_id,
            req.payment_type,
            Money::from_xaf(req.amount_xaf),
            req.method,
            metadata,
            now,
        )?;
        payment::insert(&mut tx, &created).await?;

        tx.commit().await?;

        info!(
            transaction_id = %created.transaction_id,
            order_number = %target.order_number,
            payment_type = %created.payment_type,
            method = %created.method,
            amount_xaf = created.amount_xaf,
            "Payment created"
        );
        Ok(created)
    }

    /// Create, then run the gateway round trip. Cash on delivery payments
    /// are only created.
    pub async fn create_and_process(&self, req: CreatePaymentRequest) -> ApiResult<Payment> {
        let created = self.create(req).await?;
        if !created.method.uses_gateway() {
            return Ok(created);
        }
        self.process(&created.id).await
    }

    pub async fn create_cash_on_delivery(&self, req: CashOnDeliveryRequest) -> ApiResult<Payment> {
        self.create(req.into()).await
    }

    pub async fn create_mobile_money(&self, req: MobileMoneyPaymentRequest) -> ApiResult<Payment> {
        if !req.provider.is_mobile_money() {
            return Err(ApiError::validation(format!(
                "{} is not a mobile money provider",
                req.provider
            )));
        }
        self.create_and_process(req.into()).await
    }

    pub async fn create_card(&self, req: CardPaymentRequest) -> ApiResult<Payment> {
        self.create_and_process(req.into()).await
    }

    /// Sends a `pending` payment through the gateway and records the outcome.
    pub async fn process(&self, payment_id: &str) -> ApiResult<Payment> {
        let mut claimed = self.claim(payment_id).await?;

        let decision = self.state.gateway.authorize(&claimed).await;

        let now = Utc::now();
        match decision {
            GatewayDecision::Approved { reference } => claimed.complete(Some(reference), now),
            GatewayDecision::Declined { reason } => {
                warn!(transaction_id = %claimed.transaction_id, %reason, "Payment declined");
                claimed.fail(reason, now)
            }
        }

        let paid_order = match self.record_outcome(&claimed).await {
            Ok(Recorded::Saved(paid_order)) => paid_order,
            Ok(Recorded::NotProcessing) => {
                return Err(CoreError::PaymentNotPending {
                    transaction_id: claimed.transaction_id.clone(),
                    status: "no longer processing".to_string(),
                }
                .into());
            }
            Err(e) => {
                self.abandon(&claimed, &e).await;
                return Err(e.into());
            }
        };

        info!(
            transaction_id = %claimed.transaction_id,
            status = %claimed.status,
            "Payment processed"
        );
        if let Some(paid_order) = paid_order {
            self.state
                .notifier
                .notify(Notification::payment_received(&paid_order, &claimed))
                .await;
        }
        Ok(claimed)
    }

    /// Second processing transaction: the outcome plus the order's payment
    /// status.
    async fn record_outcome(&self, claimed: &Payment) -> DbResult<Recorded> {
        let mut tx = self.state.db.begin().await?;
        if !payment::update_outcome(&mut tx, claimed).await? {
            return Ok(Recorded::NotProcessing);
        }

        let paid_order = if claimed.status == PaymentStatus::Completed {
            Some(refresh_order_payment_status(&mut tx, &claimed.order_id).await?)
        } else {
            None
        };
        tx.commit().await?;
        Ok(Recorded::Saved(paid_order))
    }

    /// Moves a payment whose outcome could not be saved from `processing` to
    /// `failed`, so it does not stay claimed forever.
    ///
    /// An approval that gets here was charged by the provider: the reference
    /// is kept in the failure reason for manual reconciliation.
    async fn abandon(&self, claimed: &Payment, cause: &DbError) {
        let reason = match &claimed.gateway_reference {
            Some(reference) => format!(
                "gateway approved ({}) but the outcome could not be saved: {}",
                reference, cause
            ),
            None => format!("outcome could not be saved: {}", cause),
        };

        let result: DbResult<bool> = async {
            let mut conn = self.state.db.acquire().await?;
            payment::fail_processing(&mut conn, &claimed.id, &reason, Utc::now()).await
        }
        .await;

        match result {
            Ok(true) => warn!(
                transaction_id = %claimed.transaction_id,
                %reason,
                "Payment marked failed after outcome was lost"
            ),
            Ok(false) => {}
            Err(e) => error!(
                transaction_id = %claimed.transaction_id,
                error = %e,
                "Payment left in processing, manual recovery needed"
            ),
        }
    }

    /// Records the cash a courier collected for a cash on delivery payment.
    pub async fn collect(&self, payment_id: &str) -> ApiResult<Payment> {
        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;

        if !payment::lock(&mut tx, payment_id).await? {
            return Err(CoreError::PaymentNotFound(payment_id.to_string()).into());
        }
        let existing = payment::find_by_id(&mut tx, payment_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::PaymentNotFound(payment_id.to_string())))?;
        if existing.method != PaymentMethod::CashOnDelivery {
            return Err(ApiError::validation(format!(
                "{} is a {} payment, only cash on delivery is collected",
                existing.transaction_id, existing.method
            )));
        }

        let reference = format!("COD-{}", existing.transaction_id);
        if !payment::collect_cash(&mut tx, payment_id, &reference, now).await? {
            return Err(CoreError::PaymentNotPending {
                transaction_id: existing.transaction_id,
                status: existing.status.to_string(),
            }
            .into());
        }
        let paid_order = refresh_order_payment_status(&mut tx, &existing.order_id).await?;
        let collected = payment::find_by_id(&mut tx, payment_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::PaymentNotFound(payment_id.to_string())))?;
        tx.commit().await?;

        info!(
            transaction_id = %collected.transaction_id,
            amount_xaf = collected.amount_xaf,
            "Cash on delivery collected"
        );
        self.state
            .notifier
            .notify(Notification::payment_received(&paid_order, &collected))
            .await;
        Ok(collected)
    }

    /// Moves the payment to `processing` in its own short transaction.
    async fn claim(&self, payment_id: &str) -> ApiResult<Payment> {
        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;

        if !payment::mark_processing(&mut tx, payment_id, now).await? {
            // Either unknown or already claimed; tell the two apart
            let existing = payment::find_by_id(&mut tx, payment_id)
                .await?
                .ok_or_else(|| ApiError::from(CoreError::PaymentNotFound(payment_id.to_string())))?;
            if !existing.method.uses_gateway() {
                return Err(ApiError::validation(format!(
                    "{} is paid on delivery and cannot be processed",
                    existing.transaction_id
                )));
            }
            return Err(CoreError::PaymentNotPending {
                transaction_id: existing.transaction_id,
                status: existing.status.to_string(),
            }
            .into());
        }

        let claimed = payment::find_by_id(&mut tx, payment_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::PaymentNotFound(payment_id.to_string())))?;
        tx.commit().await?;
        Ok(claimed)
    }

    /// Issues a refund against a completed payment.
    ///
    /// Without an amount, refunds whatever is still refundable.
    pub async fn refund(&self, payment_id: &str, req: RefundRequest) -> ApiResult<Payment> {
        let reason = req
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if reason
            .as_deref()
            .is_some_and(|r| r.chars().count() > MAX_REFUND_REASON_LEN)
        {
            return Err(ApiError::validation(format!(
                "reason must be at most {} characters",
                MAX_REFUND_REASON_LEN
            )));
        }

        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;
        let transaction_id = sequence::next_number(&mut tx, Sequence::Transaction, now).await?;

        let original = payment::find_by_id(&mut tx, payment_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::PaymentNotFound(payment_id.to_string())))?;
        let prior = payment::refunds_of(&mut tx, payment_id).await?;

        let amount = refund_amount(&original, &prior, req.amount_xaf.map(Money::from_xaf))
            .map_err(|e| {
                warn!(transaction_id = %original.transaction_id, error = %e, "Refund refused");
                e
            })?;
        let refund = Payment::new_refund(&original, transaction_id, amount, reason, now);
        payment::insert(&mut tx, &refund).await?;

        tx.commit().await?;

        info!(
            transaction_id = %refund.transaction_id,
            refund_of = %original.transaction_id,
            amount_xaf = refund.amount_xaf,
            reason = refund.refund_reason.as_deref().unwrap_or("-"),
            "Refund issued"
        );
        Ok(refund)
    }

    pub async fn get(&self, payment_id: &str) -> ApiResult<Payment> {
        self.state
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()).into())
    }

    fn metadata(req: &CreatePaymentRequest) -> ApiResult<PaymentMetadata> {
        let phone_number = req.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let card_last4 = req.card_last4.as_deref().map(str::trim).filter(|c| !c.is_empty());

        match req.method {
            PaymentMethod::OrangeMoney | PaymentMethod::MtnMobileMoney => {
                let phone = phone_number
                    .ok_or_else(|| ApiError::validation("phoneNumber is required for mobile money"))?;
                validate_phone(phone)?;
            }
            PaymentMethod::Card => {
                let last4 = card_last4
                    .ok_or_else(|| ApiError::validation("cardLast4 is required for card payments"))?;
                validate_card_last4(last4)?;
            }
            PaymentMethod::CashOnDelivery => {
                if let Some(phone) = phone_number {
                    validate_phone(phone)?;
                }
            }
        }

        Ok(PaymentMetadata {
            phone_number: phone_number.map(str::to_string),
            card_last4: card_last4.map(str::to_string),
        })
    }
}

/// Locks the order and re-derives its payment status from all payments.
async fn refresh_order_payment_status(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Order> {
    if !order::lock(conn, order_id).await? {
        return Err(DbError::not_found("order", order_id));
    }
    let mut current = order::find_by_id(conn, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("order", order_id))?;
    let payments = payment::for_order(conn, order_id).await?;

    let derived = payment_status_for(&current, &payments);
    if derived != current.payment_status {
        order::update_payment_status(conn, order_id, derived, Utc::now()).await?;
        info!(
            order_number = %current.order_number,
            from = %current.payment_status,
            to = %derived,
            "Order payment status updated"
        );
        current.payment_status = derived;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_requests_pick_method() {
        let card: CreatePaymentRequest = CardPaymentRequest {
            order_id: "o-1".to_string(),
            payment_type: PaymentType::Full,
            amount_xaf: 12_500,
            card_last4: "4242".to_string(),
        }
        .into();
        assert_eq!(card.method, PaymentMethod::Card);
        assert_eq!(card.card_last4.as_deref(), Some("4242"));

        let momo: CreatePaymentRequest = MobileMoneyPaymentRequest {
            order_id: "o-1".to_string(),
            payment_type: PaymentType::Deposit,
            amount_xaf: 3_750,
            provider: PaymentMethod::MtnMobileMoney,
            phone_number: "+237670000000".to_string(),
        }
        .into();
        assert_eq!(momo.method, PaymentMethod::MtnMobileMoney);
        assert!(momo.card_last4.is_none());
    }

    #[test]
    fn test_metadata_requires_channel_details() {
        let req = CreatePaymentRequest {
            order_id: "o-1".to_string(),
            payment_type: PaymentType::Deposit,
            amount_xaf: 3_750,
            method: PaymentMethod::OrangeMoney,
            phone_number: None,
            card_last4: None,
        };
        assert!(PaymentService::metadata(&req).is_err());

        let with_phone = CreatePaymentRequest {
            phone_number: Some(" 670000000 ".to_string()),
            ..req
        };
        let metadata = PaymentService::metadata(&with_phone).unwrap();
        assert_eq!(metadata.phone_number.as_deref(), Some("670000000"));
    }

    #[test]
    fn test_cash_on_delivery_needs_no_channel_details() {
        let cod: CreatePaymentRequest = CashOnDeliveryRequest {
            order_id: "o-1".to_string(),
            payment_type: PaymentType::Full,
            amount_xaf: 12_500,
            phone_number: None,
        }
        .into();
        assert_eq!(cod.method, PaymentMethod::CashOnDelivery);
        assert_eq!(PaymentService::metadata(&cod).unwrap(), PaymentMetadata::default());

        let bad_phone = CreatePaymentRequest {
            phone_number: Some("12".to_string()),
            ..cod
        };
        assert!(PaymentService::metadata(&bad_phone).is_err());
    }
}
