//! Integration tests for authenticated downloads.

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use common::{body_bytes, body_json, build_test_app};

#[sqlx::test(migrations = "../db/migrations")]
async fn download_advertises_the_original_filename(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    app.put_json(
        "/admin/daily-limit",
        Some(&admin_token),
        json!({ "max_uploads": 10 }),
    )
    .await;
    app.grant_slots(user.id, 1).await;

    let res = app
        .post_multipart_file("/upload", &token, "file", "essay.docx", b"the document")
        .await;
    let order_id = body_json(res).await["order"]["id"].as_i64().unwrap();

    // The stored name is namespaced; fetch it from the database the way
    // the admin dashboard would.
    let stored_path: String =
        sqlx::query_scalar("SELECT stored_file_path FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    let basename = stored_path.rsplit('/').next().unwrap();

    let res = app.get(&format!("/download/{basename}"), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename=\"essay.docx\""), "{disposition}");
    assert_eq!(body_bytes(res).await, b"the document");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_by_original_name_serves_the_newest_match(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (user, token) = app.seed_user("user@example.com", false).await;
    app.put_json(
        "/admin/daily-limit",
        Some(&admin_token),
        json!({ "max_uploads": 10 }),
    )
    .await;
    app.grant_slots(user.id, 1).await;

    app.post_multipart_file("/upload", &token, "file", "essay.docx", b"the document")
        .await;

    // No stored-name lookup: the client asks for the name it uploaded.
    let res = app.get("/download/essay.docx", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename=\"essay.docx\""), "{disposition}");
    assert_eq!(body_bytes(res).await, b"the document");

    // Admins resolve original names across all orders.
    let res = app.get("/download/essay.docx", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);

    // A name no order references still misses.
    let res = app.get("/download/unknown.docx", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn downloads_are_scoped_to_the_owner(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;
    let (owner, owner_token) = app.seed_user("owner@example.com", false).await;
    let (_, other_token) = app.seed_user("other@example.com", false).await;
    app.put_json(
        "/admin/daily-limit",
        Some(&admin_token),
        json!({ "max_uploads": 10 }),
    )
    .await;
    app.grant_slots(owner.id, 1).await;

    app.post_multipart_file("/upload", &owner_token, "file", "essay.docx", b"doc")
        .await;
    let stored_path: String =
        sqlx::query_scalar("SELECT stored_file_path FROM orders LIMIT 1")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    let basename = stored_path.rsplit('/').next().unwrap().to_string();

    let res = app
        .get(&format!("/download/{basename}"), Some(&other_token))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Admins can fetch any stored file.
    let res = app
        .get(&format!("/download/{basename}"), Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn traversal_and_missing_files_are_rejected(pool: PgPool) {
    let app = build_test_app(pool).await;
    let (_, admin_token) = app.seed_user("admin@example.com", true).await;

    let res = app
        .get("/download/..%2F..%2Fetc%2Fpasswd", Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .get("/download/1_1700000000_missing.docx", Some(&admin_token))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
