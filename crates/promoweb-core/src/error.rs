//! # Error Types
//!
//! Domain-specific error types for promoweb-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  promoweb-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  promoweb-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                 │
//! │  └── ApiError         - What the storefront sees (JSON body)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → 400 / 404 / 409         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification
//! Every `CoreError` answers [`CoreError::kind`], which is all the HTTP layer
//! needs to pick a status code. Gateway declines are NOT errors: they are
//! recorded on the payment row as `failed` with a reason.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a domain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or semantically invalid input (wrong amount, bad transition).
    Validation,
    /// Unknown order, payment, shipment or product id.
    NotFound,
    /// Not enough available stock to reserve.
    StockConflict,
    /// A unique business key already exists.
    Duplicate,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They carry enough
/// context (ids, amounts, statuses) for a human-readable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is not sellable.
    #[error("Product {sku} is not available for sale ({status})")]
    ProductUnavailable { sku: String, status: String },

    /// Not enough unreserved stock to satisfy an order line.
    ///
    /// ## When This Occurs
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// available = stock - reserved = 3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "TV-SAM-55", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole order rolled back, nothing reserved
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Order not found (by id or order number).
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Shipment not found (by id or tracking number).
    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),

    /// Checkout submitted without any line.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Checkout submitted with too many distinct lines.
    #[error("Order cannot have more than {max} items")]
    TooManyLines { max: usize },

    /// Status change not present in the order transition table.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidOrderTransition { from: String, to: String },

    /// Customer cancellation requested outside `pending | confirmed`.
    #[error("Order {order_number} cannot be cancelled in status {status}")]
    OrderNotCancellable {
        order_number: String,
        status: String,
    },

    /// Payments are refused on cancelled or refunded orders.
    #[error("Order {order_number} is {status} and accepts no payments")]
    OrderClosedForPayment {
        order_number: String,
        status: String,
    },

    /// Payment amount does not equal the order field for its type.
    #[error("Invalid {payment_type} amount: expected {expected} XAF, got {actual} XAF")]
    PaymentAmountMismatch {
        payment_type: String,
        expected: i64,
        actual: i64,
    },

    /// Refund rows are only created through the refund operation.
    #[error("Refunds cannot be created as payments, use the refund operation")]
    DirectRefundNotAllowed,

    /// Only pending payments can be sent to the gateway.
    #[error("Payment {transaction_id} is {status}, only pending payments can be processed")]
    PaymentNotPending {
        transaction_id: String,
        status: String,
    },

    /// Refund requested on a payment that cannot be refunded.
    #[error("Payment {transaction_id} cannot be refunded: {reason}")]
    RefundNotAllowed {
        transaction_id: String,
        reason: String,
    },

    /// Refund larger than what is left of the original payment.
    #[error("Refund of {requested} XAF exceeds refundable amount of {refundable} XAF")]
    RefundExceedsOriginal { requested: i64, refundable: i64 },

    /// Shipments can only be created for confirmed orders.
    #[error("Order {order_number} must be confirmed to create a shipment (status: {status})")]
    ShipmentRequiresConfirmedOrder {
        order_number: String,
        status: String,
    },

    /// Status change refused by the shipment lifecycle.
    #[error("Cannot change shipment status from {from} to {to}")]
    InvalidShipmentTransition { from: String, to: String },

    /// Parcel heavier than the zone accepts.
    #[error("Total weight {weight_grams} g exceeds the {max_grams} g limit of zone {zone}")]
    WeightLimitExceeded {
        zone: String,
        weight_grams: i64,
        max_grams: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::PaymentNotFound(_)
            | CoreError::ShipmentNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::StockConflict,
            CoreError::Validation(ValidationError::Duplicate { .. }) => ErrorKind::Duplicate,
            _ => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "TV-SAM-55".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TV-SAM-55: available 0, requested 1"
        );

        let err = CoreError::PaymentAmountMismatch {
            payment_type: "deposit".to_string(),
            expected: 3_750,
            actual: 3_000,
        };
        assert_eq!(
            err.to_string(),
            "Invalid deposit amount: expected 3750 XAF, got 3000 XAF"
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CoreError::OrderNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::InsufficientStock {
                sku: "A".into(),
                available: 0,
                requested: 1
            }
            .kind(),
            ErrorKind::StockConflict
        );
        assert_eq!(CoreError::EmptyOrder.kind(), ErrorKind::Validation);
        assert_eq!(
            CoreError::from(ValidationError::Duplicate {
                field: "sku".into(),
                value: "A".into()
            })
            .kind(),
            ErrorKind::Duplicate
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
