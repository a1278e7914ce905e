/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use goexpress_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::middleware::{identity::identity_layer, security::SecurityHeadersLayer};
use crate::routes;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor; both fields
/// are reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Access token signing key
    pub fn access_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Refresh token signing key
    pub fn refresh_secret(&self) -> &str {
        &self.config.jwt.refresh_secret
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        self.config.jwt.access_ttl()
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        self.config.jwt.refresh_ttl()
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /                                   welcome
/// /health                             health check
/// /api/auth/{register,login,refresh}
/// /api/zones[/:id]
/// /api/quote
/// /api/shipments[/:id[/status|/driver|/tracking-history]]
/// /api/users[/stats|/profile|/change-password|/:id[/reset-password]]
/// /api/customers[/stats|/:id[/shipments|/addresses]]
/// /api/drivers[/stats|/:id[/shipments]]
/// ```
///
/// Identity is resolved for every route; each handler asks the
/// authorization policy whether the caller may proceed.
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, compression, request tracing,
/// identity.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let zone_routes = Router::new()
        .route("/", get(routes::zones::list_zones).post(routes::zones::create_zone))
        .route(
            "/:id",
            get(routes::zones::get_zone)
                .put(routes::zones::update_zone)
                .delete(routes::zones::delete_zone),
        );

    let shipment_routes = Router::new()
        .route(
            "/",
            get(routes::shipments::list_shipments).post(routes::shipments::create_shipment),
        )
        .route("/:id", get(routes::shipments::get_shipment))
        .route("/:id/status", put(routes::shipments::update_status))
        .route("/:id/driver", put(routes::shipments::assign_driver))
        .route("/:id/tracking-history", get(routes::shipments::tracking_history));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users).post(routes::users::create_user))
        .route("/stats", get(routes::users::user_stats))
        .route(
            "/profile",
            get(routes::users::get_profile).put(routes::users::update_profile),
        )
        .route("/change-password", post(routes::users::change_password))
        .route(
            "/:id",
            put(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route("/:id/reset-password", post(routes::users::reset_password));

    let customer_routes = Router::new()
        .route(
            "/",
            get(routes::customers::list_customers).post(routes::customers::create_customer),
        )
        .route("/stats", get(routes::customers::customer_stats))
        .route(
            "/:id",
            get(routes::customers::get_customer)
                .put(routes::customers::update_customer)
                .delete(routes::customers::delete_customer),
        )
        .route("/:id/shipments", get(routes::customers::customer_shipments))
        .route(
            "/:id/addresses",
            get(routes::customers::list_addresses).post(routes::customers::add_address),
        );

    let driver_routes = Router::new()
        .route(
            "/",
            get(routes::drivers::list_drivers).post(routes::drivers::create_driver),
        )
        .route("/stats", get(routes::drivers::driver_stats))
        .route(
            "/:id",
            get(routes::drivers::get_driver)
                .put(routes::drivers::update_driver)
                .delete(routes::drivers::delete_driver),
        )
        .route("/:id/shipments", get(routes::drivers::driver_shipments));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/zones", zone_routes)
        .route("/quote", post(routes::quote::quote))
        .nest("/shipments", shipment_routes)
        .nest("/users", user_routes)
        .nest("/customers", customer_routes)
        .nest("/drivers", driver_routes);

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(routes::health::welcome))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.is_production()))
        .with_state(state)
}

/// CORS policy from `CORS_ORIGINS`
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
