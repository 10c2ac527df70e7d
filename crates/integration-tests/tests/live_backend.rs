//! Flows against a live panel backend.
//!
//! These tests require:
//! - A running panel backend (`UPGROW_API_BASE_URL`, default
//!   `http://localhost:8000`)
//! - A test account (`UPGROW_TEST_EMAIL` / `UPGROW_TEST_PASSWORD`)
//!
//! Run with: `cargo test -p upgrow-integration-tests -- --ignored`

use rust_decimal::Decimal;

use upgrow_core::ServiceId;
use upgrow_engine::orders::OrderIntent;

use upgrow_integration_tests::{init_tracing, live_base_url, live_engine};

fn test_credentials() -> (String, String) {
    (
        std::env::var("UPGROW_TEST_EMAIL").unwrap_or_else(|_| "test@upgrow.example".to_string()),
        std::env::var("UPGROW_TEST_PASSWORD").unwrap_or_else(|_| "test-password".to_string()),
    )
}

#[tokio::test]
#[ignore = "Requires a running panel backend"]
async fn test_services_probe_reachable() {
    init_tracing();
    let response = reqwest::get(format!("{}/services", live_base_url()))
        .await
        .expect("backend should be reachable");
    // Healthy or in maintenance; anything else means misconfiguration.
    assert!(
        response.status().is_success() || response.status().as_u16() == 503,
        "unexpected probe status {}",
        response.status()
    );
}

#[tokio::test]
#[ignore = "Requires a running panel backend and test credentials"]
async fn test_login_and_reconcile_is_idempotent() {
    init_tracing();
    let engine = live_engine();
    let (email, password) = test_credentials();

    engine
        .sessions()
        .login(&email, &password)
        .await
        .expect("test account should authenticate");

    // Two reconciliations against identical backend state must agree
    // bit-for-bit.
    engine.dashboard().reconcile().await;
    let first = engine.dashboard().snapshot();
    engine.dashboard().reconcile().await;
    let second = engine.dashboard().snapshot();
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore = "Requires a running panel backend and test credentials"]
async fn test_rejected_order_surfaces_backend_detail() {
    init_tracing();
    let engine = live_engine();
    let (email, password) = test_credentials();

    engine
        .sessions()
        .login(&email, &password)
        .await
        .expect("test account should authenticate");

    let before = engine.dashboard().snapshot();

    // A cost far beyond the test account's balance forces a rejection.
    let result = engine
        .orders()
        .submit(OrderIntent {
            service_id: ServiceId::new(1),
            service_name: "Instagram Followers".to_owned(),
            quantity: 1000,
            link: "https://instagram.com/upgrow".to_owned(),
            cost: Decimal::new(1_000_000, 0),
            profit: Decimal::ZERO,
            proof_url: None,
            customer_name: None,
            payment_method: Some("balance".to_owned()),
        })
        .await;

    let err = result.expect_err("an unpayable order must be rejected");
    // The backend's detail message reaches the user verbatim.
    assert!(!err.user_message().is_empty());
    assert_eq!(engine.dashboard().snapshot(), before);
}
