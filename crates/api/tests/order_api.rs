//! Integration tests for uploads, admission gating, and the order
//! lifecycle.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, build_test_app, MultipartForm, TestApp};

async fn open_quota(app: &TestApp, admin_token: &str, max_uploads: i32) {
    let res = app
        .put_json(
            "/admin/daily-limit",
            Some(admin_token),
            json!({ "max_uploads": max_uploads }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_creates_a_pending_order(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "essay.docx", b"contents")
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["order"]["status"], "Pending");
    assert_eq!(body["order"]["original_filename"], "essay.docx");

    let res = app.get("/user/orders", Some(&token)).await;
    let orders = body_json(res).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // The slot was consumed.
    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_upload_without_a_slot_is_rejected(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "one.docx", b"a")
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .post_multipart_file("/upload", &token, "file", "two.docx", b"b")
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["code"], "INSUFFICIENT_CREDITS");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn uploads_beyond_the_daily_cap_are_rejected(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 1).await;
    app.grant_slots(user.id, 5).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "one.docx", b"a")
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .post_multipart_file("/upload", &token, "file", "two.docx", b"b")
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["code"], "QUOTA_EXCEEDED");

    // The rejected upload did not burn a slot.
    let credits = body_json(app.get("/user/credits", Some(&token)).await).await;
    assert_eq!(credits["slots_remaining"], 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_uploads_respect_the_cap(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 2).await;
    app.grant_slots(user.id, 3).await;

    let (a, b, c) = tokio::join!(
        app.post_multipart_file("/upload", &token, "file", "a.docx", b"a"),
        app.post_multipart_file("/upload", &token, "file", "b.docx", b"b"),
        app.post_multipart_file("/upload", &token, "file", "c.docx", b"c"),
    );

    let succeeded = [a.status(), b.status(), c.status()]
        .iter()
        .filter(|s| **s == StatusCode::OK)
        .count();
    assert_eq!(succeeded, 2);

    let limit = body_json(app.get("/daily-limit", Some(&token)).await).await;
    assert_eq!(limit["current_uploads"], 2);
    assert_eq!(limit["remaining"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn lifecycle_runs_pending_processing_completed(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "essay.docx", b"contents")
        .await;
    let order_id = body_json(res).await["order"]["id"].as_i64().unwrap();

    // Completing a Pending order is out of sequence.
    let mut form = MultipartForm::new();
    form.text("ai_score", "12").text("sim_score", "34");
    form.file("report1", "r1.pdf", b"r1");
    form.file("report2", "r2.pdf", b"r2");
    let res = app
        .post_form(&format!("/admin/complete/{order_id}"), &admin_token, form)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .post(&format!("/admin/orders/{order_id}/start"), Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Processing");

    // Starting twice is a state conflict.
    let res = app
        .post(&format!("/admin/orders/{order_id}/start"), Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "INVALID_STATE");

    let mut form = MultipartForm::new();
    form.text("ai_score", "12").text("sim_score", "34");
    form.file("report1", "r1.pdf", b"r1");
    form.file("report2", "r2.pdf", b"r2");
    let res = app
        .post_form(&format!("/admin/complete/{order_id}"), &admin_token, form)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["ai_score"], 12);
    assert_eq!(body["sim_score"], 34);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn starting_a_missing_order_is_not_found(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;

    let res = app.post("/admin/orders/9999/start", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_requires_both_scores_but_keeps_attached_reports(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "essay.docx", b"contents")
        .await;
    let order_id = body_json(res).await["order"]["id"].as_i64().unwrap();
    app.post(&format!("/admin/orders/{order_id}/start"), Some(&admin_token))
        .await;

    // First attempt: reports present, sim_score empty. Fails, but the
    // report files stay attached.
    let mut form = MultipartForm::new();
    form.text("ai_score", "12").text("sim_score", "");
    form.file("report1", "r1.pdf", b"r1");
    form.file("report2", "r2.pdf", b"r2");
    let res = app
        .post_form(&format!("/admin/complete/{order_id}"), &admin_token, form)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "VALIDATION_ERROR");

    // Second attempt: scores only. The earlier reports satisfy the
    // completion requirement.
    let mut form = MultipartForm::new();
    form.text("ai_score", "12").text("sim_score", "34");
    let res = app
        .post_form(&format!("/admin/complete/{order_id}"), &admin_token, form)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Completed");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_without_reports_is_rejected(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "essay.docx", b"contents")
        .await;
    let order_id = body_json(res).await["order"]["id"].as_i64().unwrap();
    app.post(&format!("/admin/orders/{order_id}/start"), Some(&admin_token))
        .await;

    let mut form = MultipartForm::new();
    form.text("ai_score", "12").text("sim_score", "34");
    let res = app
        .post_form(&format!("/admin/complete/{order_id}"), &admin_token, form)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_owner_can_delete_an_order(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (owner, owner_token) = app.seed_user("owner@example.com", false).await;
    let (_, other_token) = app.seed_user("other@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(owner.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &owner_token, "file", "essay.docx", b"contents")
        .await;
    let order_id = body_json(res).await["order"]["id"].as_i64().unwrap();

    let res = app
        .delete(&format!("/user/orders/{order_id}"), Some(&other_token))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .delete(&format!("/user/orders/{order_id}"), Some(&owner_token))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let orders = body_json(app.get("/user/orders", Some(&owner_token)).await).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_listing_includes_owner_details(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    open_quota(&app, &admin_token, 10).await;
    app.grant_slots(user.id, 1).await;

    app.post_multipart_file("/upload", &token, "file", "essay.docx", b"contents")
        .await;

    let orders = body_json(app.get("/admin/orders", Some(&admin_token)).await).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["owner_email"], "user@example.com");
}
