// Storage-level invariant tests. These need a real PostgreSQL instance and
// are skipped when DATABASE_URL is not set; each test works on its own
// member so they can run in parallel against a shared database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use fest_core::domains::auth::JwtService;
use fest_core::domains::cart::{CartItem, CartSnapshot, CartWorkshopItem};
use fest_core::domains::catalog::{EventInput, FestEvent, Workshop, WorkshopInput};
use fest_core::domains::combo::ActiveCombo;
use fest_core::domains::member::{Affiliation, Member};
use fest_core::domains::payment::{OrderStatus, PaymentOrder};
use fest_core::server::build_app;
use fest_core::Config;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(pool)
}

async fn fresh_member(pool: &PgPool) -> Member {
    let tag = Uuid::new_v4().simple().to_string();
    Member::upsert_from_identity(
        &format!("kp_{tag}"),
        &format!("asha+{tag}@snu.edu.in"),
        "Asha Venkat",
        Affiliation::Host,
        pool,
    )
    .await
    .expect("member insert")
}

async fn fresh_event(fee: i64, pool: &PgPool) -> FestEvent {
    FestEvent::create(
        &EventInput {
            title: "Robowars".to_string(),
            tag: "flagship".to_string(),
            department: "Mechanical".to_string(),
            fee,
            venue: None,
            starts_at: None,
            ends_at: None,
            registration_open: true,
            media_url: None,
        },
        pool,
    )
    .await
    .expect("event insert")
}

async fn fresh_workshop(price: i64, pool: &PgPool) -> Workshop {
    Workshop::create(
        &WorkshopInput {
            title: "Rust for Embedded".to_string(),
            description: "Bare-metal firmware in Rust".to_string(),
            departments: vec!["ECE".to_string()],
            lecturers: vec![],
            price,
            registration_open: true,
            media_url: None,
        },
        pool,
    )
    .await
    .expect("workshop insert")
}

#[tokio::test]
async fn snapshot_reflects_rows_and_sweeps_invalid_combo() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let member = fresh_member(&pool).await;
    let event = fresh_event(500, &pool).await;
    let workshop = fresh_workshop(350, &pool).await;
    CartItem::add(member.id, event.id, event.fee, &pool)
        .await
        .unwrap();
    CartWorkshopItem::add(member.id, workshop.id, workshop.price, &pool)
        .await
        .unwrap();

    // An events-only package cannot hold with a workshop in the cart.
    ActiveCombo::select(member.id, "all-events", 199, &pool)
        .await
        .unwrap();

    let snapshot = CartSnapshot::load_reconciled(member.id, &pool)
        .await
        .unwrap();
    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.events[0].event_id, event.id);
    assert_eq!(snapshot.events[0].fee, 500);
    assert_eq!(snapshot.workshops.len(), 1);
    assert_eq!(snapshot.workshops[0].workshop_id, workshop.id);
    assert!(snapshot.active_combo.is_none());

    // The invalid selection was deleted, not just hidden from the snapshot.
    let stored = ActiveCombo::find_for_member(member.id, &pool).await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn initiate_charges_combo_price_not_cart_fees() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let member = fresh_member(&pool).await;
    let event = fresh_event(500, &pool).await;
    CartItem::add(member.id, event.id, event.fee, &pool)
        .await
        .unwrap();
    ActiveCombo::select(member.id, "all-events", 199, &pool)
        .await
        .unwrap();

    let config = Config {
        database_url: std::env::var("DATABASE_URL").unwrap(),
        port: 0,
        jwt_secret: "test_secret".to_string(),
        jwt_issuer: "test_issuer".to_string(),
        allowed_origins: vec![],
        host_email_domains: vec!["snu.edu.in".to_string()],
        payu_merchant_key: "gtKFFx".to_string(),
        payu_merchant_salt: "eCwWELxi".to_string(),
        payu_base_url: "http://127.0.0.1:9".to_string(),
        payment_return_url: "http://127.0.0.1:3000".to_string(),
        verify_poll_attempts: 1,
        verify_poll_delay_ms: 1,
        rate_limit_enabled: false,
    };
    let app = build_app(pool.clone(), config);

    let token = JwtService::new("test_secret", "test_issuer".to_string())
        .create_token(&member.kinde_id, &member.email, false)
        .unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payment/initiate")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"kinde_id":"{}"}}"#,
                    member.kinde_id
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    // Combo price, not the 500-rupee event fee sitting in the cart.
    assert_eq!(body["session_data"]["amount"], 199);
    assert_eq!(body["session_data"]["fields"]["amount"], "199.00");
}

#[tokio::test]
async fn completed_verification_clears_cart_and_combo() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let member = fresh_member(&pool).await;
    let event = fresh_event(500, &pool).await;
    CartItem::add(member.id, event.id, event.fee, &pool)
        .await
        .unwrap();
    ActiveCombo::select(member.id, "all-events", 199, &pool)
        .await
        .unwrap();

    let order = PaymentOrder::create(
        member.id,
        "all-events",
        199,
        member.first_name(),
        &member.email,
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(order.firstname, "Asha");

    let order = PaymentOrder::mark_redirected(order.id, &pool)
        .await
        .unwrap()
        .expect("pending order moves to redirected");
    assert_eq!(order.status, OrderStatus::Redirected);

    let settled = PaymentOrder::complete_and_clear_cart(order.id, member.id, &pool)
        .await
        .unwrap();
    assert!(settled);

    let order = PaymentOrder::find_by_txn_id(&order.txn_id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let snapshot = CartSnapshot::load(member.id, &pool).await.unwrap();
    assert!(snapshot.is_empty());
    assert!(snapshot.active_combo.is_none());

    // The settled order is sticky against both late transitions.
    assert!(!PaymentOrder::complete_and_clear_cart(order.id, member.id, &pool)
        .await
        .unwrap());
    assert!(!PaymentOrder::mark_failed(order.id, &pool).await.unwrap());
}
