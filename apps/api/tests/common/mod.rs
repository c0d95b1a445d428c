//! Shared fixtures: in-memory or file-backed database, instant gateway, a
//! small catalogue.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use promoweb_api::services::gateway::{FixedGateway, GatewayDecision, PaymentGateway};
use promoweb_api::services::notifier::{Notification, Notifier};
use promoweb_api::services::order_service::CreateOrderRequest;
use promoweb_api::{ApiConfig, AppState};
use promoweb_core::{Address, OrderLine, Payment, Product, ProductStatus, ShippingZone};
use promoweb_db::{Database, DbConfig};
use uuid::Uuid;

pub async fn state_with(gateway: Arc<dyn PaymentGateway>) -> Arc<AppState> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        gateway_delay_ms: 0,
        ..ApiConfig::default()
    };
    Arc::new(AppState::new(db, config).with_gateway(gateway))
}

/// Keeps every notification for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.sent().iter().map(|n| n.event.topic()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// Littoral zone seeded, notifications recorded.
pub async fn recording_state(
    gateway: Arc<dyn PaymentGateway>,
) -> (Arc<AppState>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        gateway_delay_ms: 0,
        ..ApiConfig::default()
    };
    let state = Arc::new(
        AppState::new(db, config)
            .with_gateway(gateway)
            .with_notifier(notifier.clone()),
    );
    seed_zone(&state, "Littoral", 2_000, 500).await;
    (state, notifier)
}

/// Approves every payment, but first makes SQLite refuse to store a
/// completed payment, so the outcome of the approval cannot be saved.
pub struct UnsavableApprovalGateway {
    pub db: Database,
}

#[async_trait]
impl PaymentGateway for UnsavableApprovalGateway {
    async fn authorize(&self, payment: &Payment) -> GatewayDecision {
        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS refuse_completion
            BEFORE UPDATE OF status ON payments
            WHEN NEW.status = 'completed'
            BEGIN
                SELECT RAISE(ABORT, 'disk I/O error');
            END
            "#,
        )
        .execute(self.db.pool())
        .await
        .unwrap();

        GatewayDecision::Approved {
            reference: format!("OM-{}", payment.transaction_id),
        }
    }
}

/// Approving state on a real file with a multi-connection pool, so writers
/// actually contend for SQLite's lock instead of queueing on one connection.
pub async fn file_backed_state(path: &Path, max_connections: u32) -> Arc<AppState> {
    let db = Database::new(DbConfig::new(path).max_connections(max_connections))
        .await
        .unwrap();
    let config = ApiConfig {
        gateway_delay_ms: 0,
        ..ApiConfig::default()
    };
    let state = Arc::new(AppState::new(db, config).with_gateway(Arc::new(FixedGateway::approving())));
    seed_zone(&state, "Littoral", 2_000, 500).await;
    state
}

/// State whose gateway approves everything, with the Littoral zone seeded.
pub async fn approving_state() -> Arc<AppState> {
    let state = state_with(Arc::new(FixedGateway::approving())).await;
    seed_zone(&state, "Littoral", 2_000, 500).await;
    state
}

pub async fn declining_state() -> Arc<AppState> {
    let state = state_with(Arc::new(FixedGateway::declining())).await;
    seed_zone(&state, "Littoral", 2_000, 500).await;
    state
}

pub async fn seed_zone(state: &AppState, code: &str, base_rate_xaf: i64, per_kg_rate_xaf: i64) {
    let zone = ShippingZone {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: code.to_string(),
        base_rate_xaf,
        per_kg_rate_xaf,
        free_shipping_threshold_xaf: None,
        max_weight_grams: Some(30_000),
        min_delivery_days: 1,
        max_delivery_days: 2,
        is_active: true,
        created_at: Utc::now(),
    };
    state.db.shipping_zones().insert(&zone).await.unwrap();
}

pub async fn seed_product(
    state: &AppState,
    sku: &str,
    price_xaf: i64,
    weight_grams: i64,
    stock: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: format!("Product {}", sku),
        brand: None,
        image_url: None,
        price_xaf,
        weight_grams,
        stock_quantity: stock,
        reserved_quantity: 0,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    };
    state.db.products().insert(&product).await.unwrap();
    product
}

pub async fn reload(state: &AppState, product_id: &str) -> Product {
    state.db.products().get_by_id(product_id).await.unwrap().unwrap()
}

pub fn douala() -> Address {
    Address {
        street_address: "Rue Joss, Bonanjo".to_string(),
        city: "Douala".to_string(),
        region: Some("Littoral".to_string()),
        postal_code: None,
        country: "CM".to_string(),
    }
}

pub fn order_request(lines: &[(&str, i64)]) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_name: "Awa Nkeng".to_string(),
        customer_email: "awa@example.cm".to_string(),
        customer_phone: "+237670000000".to_string(),
        shipping_address: douala(),
        notes: None,
        items: lines
            .iter()
            .map(|(product_id, quantity)| OrderLine {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
        deposit_percentage: Some(30),
    }
}
