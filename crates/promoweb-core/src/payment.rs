//! # Payment Records
//!
//! One monetary movement against an order, plus the pure rules around it.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create ──► pending ──► processing ──┬──► completed ──► (refund rows)   │
//! │               │                      │                                  │
//! │               │                      └──► failed (failure_reason)       │
//! │               │                                                         │
//! │               └── cash on delivery: collected ──► completed             │
//! │                                                                         │
//! │  Amount check at creation:                                              │
//! │    deposit → order.deposit_amount                                       │
//! │    balance → order.remaining_amount                                     │
//! │    full    → order.total                                                │
//! │    refund  → never created directly                                     │
//! │                                                                         │
//! │  Order payment status, recomputed from scratch after each completion:   │
//! │    paid = Σ completed non-refund amounts                                │
//! │    paid >= total   → fully_paid                                         │
//! │    paid >= deposit → deposit_paid                                       │
//! │    otherwise       → pending                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Refund rows carry a negative amount and point at the original through
//! `refund_of`. Payment rows are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::order::{Order, OrderPaymentStatus};

// =============================================================================
// Enums
// =============================================================================

/// What a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// The upfront "acompte".
    Deposit,
    /// Everything after the deposit.
    Balance,
    /// Whole order in one go.
    Full,
    Refund,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Deposit => "deposit",
            PaymentType::Balance => "balance",
            PaymentType::Full => "full",
            PaymentType::Refund => "refund",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    OrangeMoney,
    MtnMobileMoney,
    Card,
    /// Paid in cash to the courier; never sent to a gateway.
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::OrangeMoney => "orange_money",
            PaymentMethod::MtnMobileMoney => "mtn_mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }

    #[inline]
    pub fn is_mobile_money(&self) -> bool {
        matches!(self, PaymentMethod::OrangeMoney | PaymentMethod::MtnMobileMoney)
    }

    /// Whether payments with this method are authorised by a gateway.
    #[inline]
    pub fn uses_gateway(&self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards an order (or a refund of one).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    /// `TXN` + `YYYYMMDD` + daily counter.
    pub transaction_id: String,
    pub order_id: String,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    /// Amount in XAF, negative for refunds.
    pub amount_xaf: i64,
    /// Mobile money wallet number.
    pub phone_number: Option<String>,
    pub card_last4: Option<String>,
    /// Reference returned by the gateway on success.
    pub gateway_reference: Option<String>,
    /// For refund rows: the payment being refunded.
    pub refund_of: Option<String>,
    /// For refund rows: why the money went back.
    pub refund_reason: Option<String>,
    pub failure_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Channel details captured with a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMetadata {
    pub phone_number: Option<String>,
    pub card_last4: Option<String>,
}

impl Payment {
    /// Builds a new `pending` payment after checking it against the order.
    pub fn new_pending(
        order: &Order,
        transaction_id: String,
        payment_type: PaymentType,
        amount: Money,
        method: PaymentMethod,
        metadata: PaymentMetadata,
        now: DateTime<Utc>,
    ) -> CoreResult<Payment> {
        check_new_payment(order, payment_type, amount)?;

        Ok(Payment {
            id: Uuid::new_v4().to_string(),
            transaction_id,
            order_id: order.id.clone(),
            payment_type,
            status: PaymentStatus::Pending,
            method,
            amount_xaf: amount.xaf(),
            phone_number: metadata.phone_number,
            card_last4: metadata.card_last4,
            gateway_reference: None,
            refund_of: None,
            refund_reason: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Builds the refund row for `original`. It is completed on creation.
    pub fn new_refund(
        original: &Payment,
        transaction_id: String,
        amount: Money,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Payment {
        Payment {
            id: Uuid::new_v4().to_string(),
            transaction_id,
            order_id: original.order_id.clone(),
            payment_type: PaymentType::Refund,
            status: PaymentStatus::Completed,
            method: original.method,
            amount_xaf: -amount.abs().xaf(),
            phone_number: original.phone_number.clone(),
            card_last4: original.card_last4.clone(),
            gateway_reference: None,
            refund_of: Some(original.id.clone()),
            refund_reason: reason,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_xaf(self.amount_xaf)
    }

    #[inline]
    pub fn is_refund(&self) -> bool {
        self.payment_type == PaymentType::Refund
    }

    pub fn complete(&mut self, reference: Option<String>, now: DateTime<Utc>) {
        self.status = PaymentStatus::Completed;
        self.gateway_reference = reference;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason);
        self.updated_at = now;
    }
}

// =============================================================================
// Rules
// =============================================================================

/// The amount a payment of `payment_type` must carry for `order`.
pub fn expected_amount(order: &Order, payment_type: PaymentType) -> CoreResult<Money> {
    match payment_type {
        PaymentType::Deposit => Ok(order.deposit_amount()),
        PaymentType::Balance => Ok(order.remaining_amount()),
        PaymentType::Full => Ok(order.total()),
        PaymentType::Refund => Err(CoreError::DirectRefundNotAllowed),
    }
}

/// Checks a new payment against the order before any row is written.
pub fn check_new_payment(order: &Order, payment_type: PaymentType, amount: Money) -> CoreResult<()> {
    if !order.status.accepts_payments() {
        return Err(CoreError::OrderClosedForPayment {
            order_number: order.order_number.clone(),
            status: order.status.to_string(),
        });
    }

    let expected = expected_amount(order, payment_type)?;
    if amount != expected {
        return Err(CoreError::PaymentAmountMismatch {
            payment_type: payment_type.to_string(),
            expected: expected.xaf(),
            actual: amount.xaf(),
        });
    }

    Ok(())
}

/// Derives the order's payment status from all of its payments.
///
/// Pure and idempotent: the same payments always give the same answer,
/// no matter the order they completed in. Refund rows are ignored.
///
/// ## Example
/// ```rust
/// use promoweb_core::payment::derive_payment_status;
/// use promoweb_core::{Money, OrderPaymentStatus};
///
/// let status = derive_payment_status(
///     Money::from_xaf(12_500),
///     Money::from_xaf(3_750),
///     [Money::from_xaf(3_750)],
/// );
/// assert_eq!(status, OrderPaymentStatus::DepositPaid);
/// ```
pub fn derive_payment_status(
    total: Money,
    deposit_amount: Money,
    completed_non_refund: impl IntoIterator<Item = Money>,
) -> OrderPaymentStatus {
    let paid: Money = completed_non_refund.into_iter().sum();

    if paid >= total {
        OrderPaymentStatus::FullyPaid
    } else if paid >= deposit_amount {
        OrderPaymentStatus::DepositPaid
    } else {
        OrderPaymentStatus::Pending
    }
}

/// Convenience over [`derive_payment_status`] for a loaded order.
pub fn payment_status_for(order: &Order, payments: &[Payment]) -> OrderPaymentStatus {
    derive_payment_status(
        order.total(),
        order.deposit_amount(),
        payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed && !p.is_refund())
            .map(Payment::amount),
    )
}

/// Decides how much to refund against `original`.
///
/// ## Rules
/// - original must be `completed` and not itself a refund
/// - default amount is what is still refundable
/// - requested amount must be positive
/// - cumulative refunds never exceed the original amount
pub fn refund_amount(
    original: &Payment,
    prior_refunds: &[Payment],
    requested: Option<Money>,
) -> CoreResult<Money> {
    if original.is_refund() {
        return Err(CoreError::RefundNotAllowed {
            transaction_id: original.transaction_id.clone(),
            reason: "refunds cannot be refunded".to_string(),
        });
    }
    if original.status != PaymentStatus::Completed {
        return Err(CoreError::RefundNotAllowed {
            transaction_id: original.transaction_id.clone(),
            reason: format!("payment is {}", original.status),
        });
    }

    let already_refunded: Money = prior_refunds
        .iter()
        .filter(|r| r.refund_of.as_deref() == Some(original.id.as_str()))
        .map(|r| r.amount().abs())
        .sum();
    let refundable = original.amount() - already_refunded;

    let amount = requested.unwrap_or(refundable);
    if !amount.is_positive() {
        if requested.is_none() {
            return Err(CoreError::RefundNotAllowed {
                transaction_id: original.transaction_id.clone(),
                reason: "payment is already fully refunded".to_string(),
            });
        }
        return Err(ValidationError::MustBePositive {
            field: "refund amount".to_string(),
        }
        .into());
    }
    if amount > refundable {
        return Err(CoreError::RefundExceedsOriginal {
            requested: amount.xaf(),
            refundable: refundable.xaf(),
        });
    }

    Ok(amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::types::Address;

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: "o-1".to_string(),
            order_number: "PMW202610190001".to_string(),
            customer_name: "Jean Mbarga".to_string(),
            customer_email: "jean@example.cm".to_string(),
            customer_phone: "+237690000000".to_string(),
            shipping_address: Address {
                street_address: "Bonapriso".to_string(),
                city: "Douala".to_string(),
                region: Some("Littoral".to_string()),
                postal_code: None,
                country: "CM".to_string(),
            },
            notes: None,
            subtotal_xaf: 10_000,
            shipping_cost_xaf: 2_500,
            total_xaf: 12_500,
            deposit_percentage: 30,
            deposit_amount_xaf: 3_750,
            remaining_amount_xaf: 8_750,
            total_weight_grams: 1_000,
            status,
            payment_status: OrderPaymentStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    fn completed(order: &Order, payment_type: PaymentType) -> Payment {
        let amount = expected_amount(order, payment_type).unwrap();
        let mut p = Payment::new_pending(
            order,
            "TXN20261019000001".to_string(),
            payment_type,
            amount,
            PaymentMethod::OrangeMoney,
            PaymentMetadata::default(),
            Utc::now(),
        )
        .unwrap();
        p.status = PaymentStatus::Processing;
        p.complete(Some("OM-REF".to_string()), Utc::now());
        p
    }

    #[test]
    fn test_amount_must_match_type() {
        let o = order(OrderStatus::Pending);
        assert!(check_new_payment(&o, PaymentType::Deposit, Money::from_xaf(3_750)).is_ok());
        assert!(check_new_payment(&o, PaymentType::Balance, Money::from_xaf(8_750)).is_ok());
        assert!(check_new_payment(&o, PaymentType::Full, Money::from_xaf(12_500)).is_ok());

        let err = check_new_payment(&o, PaymentType::Deposit, Money::from_xaf(3_749)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentAmountMismatch { expected: 3_750, actual: 3_749, .. }
        ));
    }

    #[test]
    fn test_cash_on_delivery_skips_gateway() {
        assert!(!PaymentMethod::CashOnDelivery.uses_gateway());
        assert!(!PaymentMethod::CashOnDelivery.is_mobile_money());
        assert!(PaymentMethod::Card.uses_gateway());
        assert_eq!(PaymentMethod::CashOnDelivery.as_str(), "cash_on_delivery");
    }

    #[test]
    fn test_refund_type_cannot_be_created_directly() {
        let o = order(OrderStatus::Pending);
        let err = check_new_payment(&o, PaymentType::Refund, Money::from_xaf(-100)).unwrap_err();
        assert!(matches!(err, CoreError::DirectRefundNotAllowed));
    }

    #[test]
    fn test_closed_orders_refuse_payments() {
        for status in [OrderStatus::Cancelled, OrderStatus::Refunded] {
            let o = order(status);
            let err = check_new_payment(&o, PaymentType::Full, o.total()).unwrap_err();
            assert!(matches!(err, CoreError::OrderClosedForPayment { .. }));
        }
    }

    #[test]
    fn test_derive_payment_status_thresholds() {
        let total = Money::from_xaf(12_500);
        let deposit = Money::from_xaf(3_750);

        assert_eq!(derive_payment_status(total, deposit, []), OrderPaymentStatus::Pending);
        assert_eq!(
            derive_payment_status(total, deposit, [Money::from_xaf(3_749)]),
            OrderPaymentStatus::Pending
        );
        assert_eq!(
            derive_payment_status(total, deposit, [deposit]),
            OrderPaymentStatus::DepositPaid
        );
        assert_eq!(
            derive_payment_status(total, deposit, [deposit, Money::from_xaf(8_750)]),
            OrderPaymentStatus::FullyPaid
        );
        assert_eq!(
            derive_payment_status(total, deposit, [total]),
            OrderPaymentStatus::FullyPaid
        );
    }

    #[test]
    fn test_payment_status_ignores_failed_and_refunds() {
        let o = order(OrderStatus::Confirmed);
        let deposit = completed(&o, PaymentType::Deposit);

        let mut failed = completed(&o, PaymentType::Balance);
        failed.status = PaymentStatus::Failed;

        let refund = Payment::new_refund(&deposit, "TXN2".into(), Money::from_xaf(1_000), None, Utc::now());

        let payments = vec![deposit, failed, refund];
        assert_eq!(payment_status_for(&o, &payments), OrderPaymentStatus::DepositPaid);

        // Same answer whatever the order of rows.
        let reversed: Vec<_> = payments.into_iter().rev().collect();
        assert_eq!(payment_status_for(&o, &reversed), OrderPaymentStatus::DepositPaid);
    }

    #[test]
    fn test_refund_defaults_to_original_amount() {
        let o = order(OrderStatus::Delivered);
        let full = completed(&o, PaymentType::Full);

        let amount = refund_amount(&full, &[], None).unwrap();
        assert_eq!(amount.xaf(), 12_500);

        let refund = Payment::new_refund(
            &full,
            "TXN-R".into(),
            amount,
            Some("Damaged on arrival".to_string()),
            Utc::now(),
        );
        assert_eq!(refund.amount_xaf, -12_500);
        assert_eq!(refund.refund_reason.as_deref(), Some("Damaged on arrival"));
        assert_eq!(refund.status, PaymentStatus::Completed);
        assert_eq!(refund.refund_of.as_deref(), Some(full.id.as_str()));
        assert!(refund.completed_at.is_some());
    }

    #[test]
    fn test_refund_exceeding_original_rejected() {
        let o = order(OrderStatus::Delivered);
        let deposit = completed(&o, PaymentType::Deposit);

        let err = refund_amount(&deposit, &[], Some(Money::from_xaf(3_751))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RefundExceedsOriginal { requested: 3_751, refundable: 3_750 }
        ));
    }

    #[test]
    fn test_partial_refunds_are_cumulative() {
        let o = order(OrderStatus::Delivered);
        let deposit = completed(&o, PaymentType::Deposit);
        let first = Payment::new_refund(&deposit, "TXN-R1".into(), Money::from_xaf(3_000), None, Utc::now());

        assert_eq!(
            refund_amount(&deposit, &[first.clone()], None).unwrap().xaf(),
            750
        );
        assert!(refund_amount(&deposit, &[first.clone()], Some(Money::from_xaf(751))).is_err());

        let second = Payment::new_refund(&deposit, "TXN-R2".into(), Money::from_xaf(750), None, Utc::now());
        let err = refund_amount(&deposit, &[first, second], None).unwrap_err();
        assert!(matches!(err, CoreError::RefundNotAllowed { .. }));
    }

    #[test]
    fn test_refund_rules_on_original() {
        let o = order(OrderStatus::Delivered);
        let deposit = completed(&o, PaymentType::Deposit);

        let refund = Payment::new_refund(&deposit, "TXN-R".into(), Money::from_xaf(100), None, Utc::now());
        assert!(matches!(
            refund_amount(&refund, &[], None),
            Err(CoreError::RefundNotAllowed { .. })
        ));

        let mut pending = deposit.clone();
        pending.status = PaymentStatus::Pending;
        assert!(refund_amount(&pending, &[], None).is_err());

        assert!(refund_amount(&deposit, &[], Some(Money::zero())).is_err());
        assert!(refund_amount(&deposit, &[], Some(Money::from_xaf(-5))).is_err());
    }
}
