//! Shared fixtures for API integration tests.
//!
//! [`build_test_app`] wires the real router and middleware stack against a
//! per-test database and a stub payment gateway, so tests exercise the
//! same code paths as production minus the network.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use checkmate_api::auth::jwt::{generate_access_token, JwtConfig};
use checkmate_api::auth::password::hash_password;
use checkmate_api::config::ServerConfig;
use checkmate_api::router::build_app_router;
use checkmate_api::state::AppState;
use checkmate_db::models::user::{CreateUser, User};
use checkmate_db::repositories::{CreditRepo, UserRepo};
use checkmate_events::EventBus;
use checkmate_mpesa::{GatewayError, PaymentGateway, PollOutcome, StkPushHandle};

// ---------------------------------------------------------------------------
// Stub payment gateway
// ---------------------------------------------------------------------------

/// In-memory gateway: accepts every STK push and answers status queries
/// with a configurable outcome.
#[derive(Clone)]
pub struct StubGateway {
    outcome: Arc<Mutex<PollOutcome>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(PollOutcome::StillPending)),
        }
    }

    /// Set what the next status queries will report.
    pub fn set_outcome(&self, outcome: PollOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initiate_stk_push(
        &self,
        _phone_number: &str,
        _amount: u32,
        _account_reference: &str,
    ) -> Result<StkPushHandle, GatewayError> {
        Ok(StkPushHandle {
            checkout_request_id: format!("ws_CO_{}", Uuid::new_v4()),
            merchant_request_id: Uuid::new_v4().to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    }

    async fn query_status(
        &self,
        _checkout_request_id: &str,
    ) -> Result<PollOutcome, GatewayError> {
        Ok(self.outcome.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub gateway: StubGateway,
    pub jwt: JwtConfig,
    // Held so the directory outlives the test.
    upload_dir: tempfile::TempDir,
}

/// Build the full application against `pool` with test configuration.
pub async fn build_test_app(pool: PgPool) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("create upload dir");
    let jwt = JwtConfig {
        secret: "integration-test-secret-with-enough-entropy".to_string(),
        expiry_hours: 72,
    };
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.path().to_string_lossy().into_owned(),
        frontend_url: "http://localhost:5173".to_string(),
        admin_email: None,
        google_client_id: None,
        jwt: jwt.clone(),
    };

    let gateway = StubGateway::new();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        gateway: Arc::new(gateway.clone()),
        mailer: None,
        vapid_public_key: Some("test-vapid-public-key".to_string()),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        gateway,
        jwt,
        upload_dir,
    }
}

impl TestApp {
    /// Register a user directly and mint a token for them.
    pub async fn seed_user(&self, email: &str, is_admin: bool) -> (User, String) {
        let user = UserRepo::create(
            &self.pool,
            &CreateUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                password_hash: hash_password("password123").expect("hash password"),
                is_admin,
            },
        )
        .await
        .expect("seed user");
        let token = generate_access_token(user.id, &user.email, user.is_admin, &self.jwt)
            .expect("mint token");
        (user, token)
    }

    /// Grant slot credits to a user, as a settled payment would.
    pub async fn grant_slots(&self, user_id: i64, count: i32) {
        let mut tx = self.pool.begin().await.expect("begin");
        CreditRepo::grant_slots(&mut tx, user_id, count)
            .await
            .expect("grant slots");
        tx.commit().await.expect("commit");
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        self.send(request(axum::http::Method::GET, path, token, None))
            .await
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response {
        self.send(request(axum::http::Method::POST, path, token, Some(body)))
            .await
    }

    pub async fn put_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response {
        self.send(request(axum::http::Method::PUT, path, token, Some(body)))
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        self.send(request(axum::http::Method::DELETE, path, token, None))
            .await
    }

    /// POST without a body (the lifecycle endpoints).
    pub async fn post(&self, path: &str, token: Option<&str>) -> Response {
        self.send(request(axum::http::Method::POST, path, token, None))
            .await
    }

    /// Upload a single file as a multipart request.
    pub async fn post_multipart_file(
        &self,
        path: &str,
        token: &str,
        field: &str,
        filename: &str,
        content: &[u8],
    ) -> Response {
        let mut form = MultipartForm::new();
        form.file(field, filename, content);
        self.post_form(path, token, form).await
    }

    pub async fn post_form(&self, path: &str, token: &str, form: MultipartForm) -> Response {
        let builder = Request::builder()
            .method(axum::http::Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, form.content_type());
        self.send(builder.body(Body::from(form.finish())).expect("request"))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible")
    }
}

fn request(
    method: axum::http::Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize body"))
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Read a response body as raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec()
}

// ---------------------------------------------------------------------------
// Multipart form builder
// ---------------------------------------------------------------------------

/// Hand-rolled multipart/form-data encoder for tests.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("test-boundary-{}", Uuid::new_v4()),
            body: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(&mut self, name: &str, filename: &str, content: &[u8]) -> &mut Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
