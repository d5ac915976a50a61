//! Integration tests for the package catalogue and admin CRUD.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, build_test_app};

#[sqlx::test(migrations = "../db/migrations")]
async fn catalogue_is_public(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;

    app.post_json(
        "/admin/packages",
        Some(&admin_token),
        json!({ "name": "Starter", "price": 100, "slots": 1, "available_slots": 50 }),
    )
    .await;

    let res = app.get("/packages", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let packages = body.as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["name"], "Starter");
    assert_eq!(packages[0]["currency"], "KSH");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn crud_is_admin_only(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, token) = app.seed_user("user@example.com", false).await;

    let res = app
        .post_json(
            "/admin/packages",
            Some(&token),
            json!({ "name": "Starter", "price": 100, "slots": 1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_update_delete_round(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;

    let res = app
        .post_json(
            "/admin/packages",
            Some(&admin_token),
            json!({
                "name": "Pro",
                "price": 500,
                "slots": 5,
                "highlight": true,
                "features": ["priority turnaround"],
                "available_slots": 20
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body_json(res).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["highlight"], true);

    // Partial update leaves the rest untouched.
    let res = app
        .put_json(
            &format!("/admin/packages/{id}"),
            Some(&admin_token),
            json!({ "offer": "Launch week -20%" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["offer"], "Launch week -20%");
    assert_eq!(updated["name"], "Pro");
    assert_eq!(updated["slots"], 5);

    let res = app
        .delete(&format!("/admin/packages/{id}"), Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .delete(&format!("/admin/packages/{id}"), Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_packages_are_rejected(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;

    let res = app
        .post_json(
            "/admin/packages",
            Some(&admin_token),
            json!({ "name": "", "price": 100, "slots": 1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .post_json(
            "/admin/packages",
            Some(&admin_token),
            json!({ "name": "Zero", "price": 100, "slots": 0 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
