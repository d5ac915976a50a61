//! Integration tests for payment initiation, polling, and settlement.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use checkmate_mpesa::PollOutcome;
use common::{body_json, build_test_app, TestApp};

async fn seed_package(app: &TestApp, admin_token: &str, slots: i32, stock: i32) {
    let res = app
        .post_json(
            "/admin/packages",
            Some(admin_token),
            json!({
                "name": format!("{slots}-slot bundle"),
                "price": 200,
                "slots": slots,
                "available_slots": stock
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn initiation_validates_the_phone_number(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, token) = app.seed_user("user@example.com", false).await;

    for phone in ["0712345678", "+254712345678", "25471234567", "not-a-phone"] {
        let res = app
            .post_json(
                "/payment/initiate",
                Some(&token),
                json!({ "phone_number": phone, "slots": 3 }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{phone}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn initiation_requires_an_available_package(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, token) = app.seed_user("user@example.com", false).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn polling_settles_once_and_grants_slots(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (_, token) = app.seed_user("user@example.com", false).await;
    seed_package(&app, &admin_token, 3, 5).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let checkout_id = body["checkout_request_id"].as_str().unwrap().to_string();
    assert_eq!(body["transaction"]["status"], "pending");

    // Provider has no verdict yet.
    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;
    assert_eq!(body_json(res).await["status"], "pending");

    // Customer pays; the next poll settles.
    app.gateway.set_outcome(PollOutcome::Completed);
    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;
    assert_eq!(body_json(res).await["status"], "completed");

    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 3);

    // Repeated polls answer from the database and grant nothing more.
    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;
    assert_eq!(body_json(res).await["status"], "completed");
    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 3);
    assert_eq!(credits["total_purchased"], 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_payments_record_the_reason(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (_, token) = app.seed_user("user@example.com", false).await;
    seed_package(&app, &admin_token, 3, 5).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    let checkout_id = body_json(res).await["checkout_request_id"]
        .as_str()
        .unwrap()
        .to_string();

    app.gateway.set_outcome(PollOutcome::Failed {
        reason: "Request cancelled by user".to_string(),
    });
    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;
    let body = body_json(res).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["failure_reason"], "Request cancelled by user");

    // No slots for a failed payment, even if the provider later claims
    // success: the transaction is terminal.
    app.gateway.set_outcome(PollOutcome::Completed);
    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;
    assert_eq!(body_json(res).await["status"], "failed");
    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_is_scoped_to_the_paying_user(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (_, token) = app.seed_user("user@example.com", false).await;
    let (_, other_token) = app.seed_user("other@example.com", false).await;
    seed_package(&app, &admin_token, 3, 5).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    let checkout_id = body_json(res).await["checkout_request_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .get(&format!("/payment/status/{checkout_id}"), Some(&other_token))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_verify_forces_settlement(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (_, token) = app.seed_user("user@example.com", false).await;
    seed_package(&app, &admin_token, 3, 5).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    let checkout_id = body_json(res).await["checkout_request_id"]
        .as_str()
        .unwrap()
        .to_string();

    app.gateway.set_outcome(PollOutcome::Completed);
    let res = app
        .post(
            &format!("/admin/transactions/{checkout_id}/verify"),
            Some(&admin_token),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "completed");

    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 3);

    let transactions = body_json(app.get("/admin/transactions", Some(&admin_token)).await).await;
    let transactions = transactions.as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["owner_email"], "user@example.com");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn settlement_consumes_package_stock(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (_, token) = app.seed_user("user@example.com", false).await;
    seed_package(&app, &admin_token, 3, 1).await;

    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    let checkout_id = body_json(res).await["checkout_request_id"]
        .as_str()
        .unwrap()
        .to_string();

    app.gateway.set_outcome(PollOutcome::Completed);
    app.get(&format!("/payment/status/{checkout_id}"), Some(&token))
        .await;

    // The only unit of stock is gone, so the next buyer finds nothing.
    let res = app
        .post_json(
            "/payment/initiate",
            Some(&token),
            json!({ "phone_number": "254712345678", "slots": 3 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
