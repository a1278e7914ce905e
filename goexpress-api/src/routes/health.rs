/// Welcome and health check endpoints
///
/// The health check probes the database and reports pool occupancy and the
/// applied migrations. A failed probe answers 503 with the same body shape,
/// so load balancers and humans read one format.

use axum::{extract::State, http::StatusCode, Json};
use goexpress_shared::db::{
    migrations::{get_migration_status, MigrationStatus},
    pool::{get_pool_stats, health_check as probe_database, PoolStats},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::AppState;

const SERVICE_NAME: &str = "goexpress-api";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: &'static str,

    pub service: &'static str,

    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    pub pool: PoolStats,

    /// Absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationStatus>,
}

/// `GET /`
pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the GoExpress courier API",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pool = get_pool_stats(&state.db);

    if let Err(e) = probe_database(&state.db).await {
        tracing::error!(error = %e, "Health check failed: database unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                service: SERVICE_NAME,
                version: env!("CARGO_PKG_VERSION"),
                database: "disconnected",
                pool,
                migrations: None,
            }),
        );
    }

    let migrations = match get_migration_status(&state.db).await {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read migration status");
            None
        }
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            database: "connected",
            pool,
            migrations,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_welcome_names_service() {
        let Json(body) = welcome().await;
        assert_eq!(body["service"], SERVICE_NAME);
        assert!(body["version"].is_string());
    }

    #[test]
    fn test_unhealthy_response_omits_migrations() {
        let response = HealthResponse {
            status: "unhealthy",
            service: SERVICE_NAME,
            version: "0.1.0",
            database: "disconnected",
            pool: PoolStats {
                active_connections: 0,
                idle_connections: 0,
                total_connections: 0,
            },
            migrations: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["database"], "disconnected");
        assert!(value.get("migrations").is_none());
    }
}
