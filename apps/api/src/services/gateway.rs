//! # Payment Gateway
//!
//! The seam between payment processing and the outside world. Only a
//! simulated gateway exists: it waits, flips a weighted coin and hands back
//! a reference or a decline reason.
//!
//! ```text
//! PaymentService::process
//!      │  (no transaction open)
//!      ▼
//! gateway.authorize(&payment) ──► GatewayDecision::Approved { reference }
//!                             └─► GatewayDecision::Declined { reason }
//! ```
//!
//! A decline is data, never an error: it ends up as `status = failed` with
//! the reason on the payment row. Cash on delivery payments never reach a
//! gateway; they are collected by the courier.

use async_trait::async_trait;
use promoweb_core::{Payment, PaymentMethod};
use rand::Rng;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Outcome of a gateway round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    Approved { reference: String },
    Declined { reason: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, payment: &Payment) -> GatewayDecision;
}

// =============================================================================
// Simulated Gateway
// =============================================================================

/// Stand-in for Orange Money, MTN MoMo and the card acquirer.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    mobile_money_success_rate: f64,
    card_success_rate: f64,
}

impl SimulatedGateway {
    pub fn new(delay: Duration, mobile_money_success_rate: f64, card_success_rate: f64) -> Self {
        SimulatedGateway {
            delay,
            mobile_money_success_rate: mobile_money_success_rate.clamp(0.0, 1.0),
            card_success_rate: card_success_rate.clamp(0.0, 1.0),
        }
    }

    fn success_rate(&self, method: PaymentMethod) -> f64 {
        if method.is_mobile_money() {
            self.mobile_money_success_rate
        } else {
            self.card_success_rate
        }
    }

    fn reference(method: PaymentMethod) -> String {
        let prefix = match method {
            PaymentMethod::OrangeMoney => "OM",
            PaymentMethod::MtnMobileMoney => "MOMO",
            PaymentMethod::Card => "CARD",
            PaymentMethod::CashOnDelivery => "COD",
        };
        let token = Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, &token[..12].to_uppercase())
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, payment: &Payment) -> GatewayDecision {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let approved = rand::thread_rng().gen_bool(self.success_rate(payment.method));
        debug!(transaction_id = %payment.transaction_id, approved, "Simulated gateway decision");

        if approved {
            GatewayDecision::Approved {
                reference: Self::reference(payment.method),
            }
        } else if payment.method.is_mobile_money() {
            GatewayDecision::Declined {
                reason: "Mobile money payment declined by provider".to_string(),
            }
        } else {
            GatewayDecision::Declined {
                reason: "Card payment declined by issuer".to_string(),
            }
        }
    }
}

// =============================================================================
// Fixed Gateway
// =============================================================================

/// Always answers the same way. Used by tests and local demos.
#[derive(Debug, Clone)]
pub struct FixedGateway {
    approve: bool,
}

impl FixedGateway {
    pub fn approving() -> Self {
        FixedGateway { approve: true }
    }

    pub fn declining() -> Self {
        FixedGateway { approve: false }
    }
}

#[async_trait]
impl PaymentGateway for FixedGateway {
    async fn authorize(&self, payment: &Payment) -> GatewayDecision {
        if self.approve {
            GatewayDecision::Approved {
                reference: format!("TEST-{}", payment.transaction_id),
            }
        } else {
            GatewayDecision::Declined {
                reason: "Declined by test gateway".to_string(),
            }
        }
    }
}
