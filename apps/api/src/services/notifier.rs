//! # Customer Notifications
//!
//! Messages sent to the customer at three points of the workflow.
//!
//! ```text
//! OrderService::create          ──► OrderPlaced      "Order #PMW... received"
//! PaymentService::process       ──► PaymentReceived  "Payment of ... received"
//!   (and cash collection)
//! ShipmentService::update_status ──► OrderShipped    "... has shipped, track ..."
//!   (first shipped edge only)
//! ```
//!
//! Notifications go out after the transaction commits and never fail the
//! operation that triggered them. The only delivery channel here writes a
//! structured log line; an email/SMS sender plugs in behind [`Notifier`].

use async_trait::async_trait;
use promoweb_core::{Order, Payment, Shipment};
use tracing::info;

/// What happened to the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    OrderPlaced {
        total_xaf: i64,
        deposit_amount_xaf: i64,
    },
    PaymentReceived {
        transaction_id: String,
        amount_xaf: i64,
    },
    OrderShipped {
        tracking_number: String,
    },
}

impl NotificationEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            NotificationEvent::OrderPlaced { .. } => "order_placed",
            NotificationEvent::PaymentReceived { .. } => "payment_received",
            NotificationEvent::OrderShipped { .. } => "order_shipped",
        }
    }
}

/// One message for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub order_number: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event: NotificationEvent,
}

impl Notification {
    fn for_order(order: &Order, event: NotificationEvent) -> Self {
        Notification {
            order_number: order.order_number.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            event,
        }
    }

    pub fn order_placed(order: &Order) -> Self {
        Self::for_order(
            order,
            NotificationEvent::OrderPlaced {
                total_xaf: order.total_xaf,
                deposit_amount_xaf: order.deposit_amount_xaf,
            },
        )
    }

    pub fn payment_received(order: &Order, payment: &Payment) -> Self {
        Self::for_order(
            order,
            NotificationEvent::PaymentReceived {
                transaction_id: payment.transaction_id.clone(),
                amount_xaf: payment.amount_xaf,
            },
        )
    }

    pub fn order_shipped(order: &Order, shipment: &Shipment) -> Self {
        Self::for_order(
            order,
            NotificationEvent::OrderShipped {
                tracking_number: shipment.tracking_number.clone(),
            },
        )
    }

    /// Short text suitable for an SMS.
    pub fn message(&self) -> String {
        match &self.event {
            NotificationEvent::OrderPlaced {
                total_xaf,
                deposit_amount_xaf,
            } => format!(
                "Order #{} received. Total: {} XAF, deposit due: {} XAF.",
                self.order_number, total_xaf, deposit_amount_xaf
            ),
            NotificationEvent::PaymentReceived { amount_xaf, .. } => format!(
                "Payment of {} XAF received for order #{}. Thank you!",
                amount_xaf, self.order_number
            ),
            NotificationEvent::OrderShipped { tracking_number } => format!(
                "Your order #{} has shipped. Tracking number: {}.",
                self.order_number, tracking_number
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Writes every notification to the `promoweb::notifications` log target.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        info!(
            target: "promoweb::notifications",
            topic = notification.event.topic(),
            order_number = %notification.order_number,
            email = %notification.customer_email,
            phone = %notification.customer_phone,
            message = %notification.message(),
            "Customer notified"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipped() -> Notification {
        Notification {
            order_number: "PMW202610190001".to_string(),
            customer_email: "awa@example.cm".to_string(),
            customer_phone: "+237670000000".to_string(),
            event: NotificationEvent::OrderShipped {
                tracking_number: "PWA00042".to_string(),
            },
        }
    }

    #[test]
    fn test_message_names_order_and_tracking() {
        let n = shipped();
        assert_eq!(n.event.topic(), "order_shipped");
        let text = n.message();
        assert!(text.contains("PMW202610190001"));
        assert!(text.contains("PWA00042"));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        LogNotifier.notify(shipped()).await;
    }
}
