//! Common test utilities for router and integration tests
//!
//! - [`lazy_app`]: router over a pool that never connects, for paths that
//!   are decided before any database access
//! - [`TestContext`]: router over a live, migrated database
//! - [`send`]: one-shot JSON request helper
//! - Token helpers for each role

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use goexpress_api::app::{build_router, AppState};
use goexpress_api::config::Config;
use goexpress_shared::auth::jwt::{
    create_token, issue_access_token, issue_refresh_token, Claims, TokenType,
};
use goexpress_shared::auth::password::hash_password;
use goexpress_shared::db::migrations::run_migrations;
use goexpress_shared::db::pool::DEFAULT_DATABASE_URL;
use goexpress_shared::models::user::{CreateUser, User, UserRole};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-access-secret-at-least-32-characters!!";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-characters!";

/// Configuration with fixed secrets and the given database
pub fn test_config(database_url: &str) -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "JWT_REFRESH_SECRET" => Some(TEST_REFRESH_SECRET.to_string()),
        "DATABASE_URL" => Some(database_url.to_string()),
        "RUN_MIGRATIONS" => Some("false".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Router whose pool has no live connections
pub fn lazy_app() -> Router {
    let config = test_config(DEFAULT_DATABASE_URL);
    let pool = PgPool::connect_lazy(DEFAULT_DATABASE_URL).unwrap();
    build_router(AppState::new(pool, config))
}

/// Signs an access token for an arbitrary identity
pub fn token_for(user_id: i64, role: UserRole) -> String {
    issue_access_token(
        user_id,
        &format!("user-{}@example.com", user_id),
        role,
        TEST_SECRET,
        chrono::Duration::minutes(15),
    )
    .unwrap()
}

/// Signs an access token that expired an hour ago
pub fn expired_token_for(user_id: i64, role: UserRole) -> String {
    let claims = Claims::with_expiration(
        user_id,
        format!("user-{}@example.com", user_id),
        role,
        TokenType::Access,
        chrono::Duration::hours(-1),
    );
    create_token(&claims, TEST_SECRET).unwrap()
}

/// Signs a refresh token with the refresh secret
pub fn refresh_token_for(user_id: i64, role: UserRole) -> String {
    issue_refresh_token(
        user_id,
        &format!("user-{}@example.com", user_id),
        role,
        TEST_REFRESH_SECRET,
        chrono::Duration::days(1),
    )
    .unwrap()
}

/// Sends one request and returns the status and JSON body (`Null` if empty)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

/// Test context over a live database
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub admin: User,
    pub admin_token: String,
}

impl TestContext {
    /// Connects to `DATABASE_URL`, applies migrations and seeds an admin
    pub async fn new() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let db = PgPool::connect(&database_url).await?;
        run_migrations(&db).await?;

        let admin = User::create(
            &db,
            CreateUser {
                name: "Test Admin".to_string(),
                email: unique_email("admin"),
                password_hash: hash_password("admin123")?,
                role: UserRole::Admin,
            },
        )
        .await?;
        let admin_token = token_for(admin.id, UserRole::Admin);

        let app = build_router(AppState::new(db.clone(), test_config(&database_url)));

        Ok(Self {
            db,
            app,
            admin,
            admin_token,
        })
    }

    /// Registers through the API and returns `(user_id, token)`
    pub async fn register(&self, role: &str) -> (i64, String) {
        let (status, body) = send(
            &self.app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": format!("Test {}", role),
                "email": unique_email(role),
                "password": "secret1",
                "role": role,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let id = body["user"]["id"].as_i64().unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Creates a zone as admin and returns its ID
    pub async fn zone(&self, price_per_kg: f64) -> i64 {
        let (status, body) = send(
            &self.app,
            Method::POST,
            "/api/zones",
            Some(&self.admin_token),
            Some(serde_json::json!({
                "name": format!("Zone {}", Uuid::new_v4()),
                "price_per_kg": price_per_kg,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED, "zone creation failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}
