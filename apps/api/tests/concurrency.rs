//! Races on a file-backed database with a multi-connection pool.
//!
//! The in-memory fixtures pin the pool to one connection, which serialises
//! every request before it reaches SQLite. These tests open real files so
//! the guarded statements are what decides the winners.

mod common;

use common::*;
use promoweb_api::error::ErrorCode;
use promoweb_api::services::order_service::OrderService;
use promoweb_api::services::payment_service::{CreatePaymentRequest, PaymentService};
use promoweb_core::{OrderPaymentStatus, PaymentMethod, PaymentStatus, PaymentType};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Awaits every handle in spawn order.
async fn join_all<T>(handles: Vec<JoinHandle<T>>) -> Vec<T> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_checkouts_never_oversell() {
    let dir = TempDir::new().unwrap();
    let state = file_backed_state(&dir.path().join("race.db"), 8).await;
    let phone = seed_product(&state, "PHN-TEC-SPARK", 85_000, 200, 3).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = OrderService::new(state.clone());
            let req = order_request(&[(&phone.id, 1)]);
            tokio::spawn(async move { service.create(req).await })
        })
        .collect();
    let results = join_all(handles).await;

    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 3);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    let after = reload(&state, &phone.id).await;
    assert_eq!(after.stock_quantity, 3);
    assert_eq!(after.reserved_quantity, 3);
    assert_eq!(after.available_quantity(), 0);

    // Every winner got its own order number
    let mut numbers: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|d| d.order.order_number.clone())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deposit_and_balance_processed_together() {
    let dir = TempDir::new().unwrap();
    let state = file_backed_state(&dir.path().join("pay.db"), 8).await;
    let tv = seed_product(&state, "TV-HIS-32", 10_000, 1_000, 2).await;

    let placed = OrderService::new(state.clone())
        .create(order_request(&[(&tv.id, 1)]))
        .await
        .unwrap()
        .order;

    let payment = |payment_type: PaymentType, amount_xaf: i64| CreatePaymentRequest {
        order_id: placed.id.clone(),
        payment_type,
        amount_xaf,
        method: PaymentMethod::OrangeMoney,
        phone_number: Some("+237690000000".to_string()),
        card_last4: None,
    };
    let handles = vec![
        tokio::spawn({
            let service = PaymentService::new(state.clone());
            let req = payment(PaymentType::Deposit, placed.deposit_amount_xaf);
            async move { service.create_and_process(req).await }
        }),
        tokio::spawn({
            let service = PaymentService::new(state.clone());
            let req = payment(PaymentType::Balance, placed.remaining_amount_xaf);
            async move { service.create_and_process(req).await }
        }),
    ];

    for result in join_all(handles).await {
        assert_eq!(result.unwrap().status, PaymentStatus::Completed);
    }

    let reloaded = OrderService::new(state.clone()).get(&placed.id).await.unwrap();
    assert_eq!(reloaded.order.payment_status, OrderPaymentStatus::FullyPaid);
    assert_eq!(reloaded.payments.len(), 2);
}
