//! # create-admin
//!
//! Seeds an administrator account. Public registration cannot create
//! admins, so a fresh deployment runs this once.
//!
//! ```bash
//! ADMIN_EMAIL=ops@goexpress.com ADMIN_PASSWORD=change-me cargo run -p goexpress-api --bin create-admin
//! ```
//!
//! Reads `DATABASE_URL`, `ADMIN_NAME`, `ADMIN_EMAIL` and `ADMIN_PASSWORD`.
//! Running it again with an existing email leaves that account untouched.

use std::env;

use anyhow::{bail, Context};
use goexpress_shared::{
    auth::password::{hash_password, MIN_PASSWORD_LENGTH},
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig, DEFAULT_DATABASE_URL},
    },
    models::user::{CreateUser, User, UserRole},
};

const DEFAULT_NAME: &str = "System Administrator";
const DEFAULT_EMAIL: &str = "admin@goexpress.com";
const DEFAULT_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_admin=info,goexpress_shared=info".into()),
        )
        .init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());
    let email = env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| DEFAULT_EMAIL.to_string())
        .trim()
        .to_lowercase();
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("ADMIN_PASSWORD must be at least {} characters", MIN_PASSWORD_LENGTH);
    }

    ensure_database_exists(&database_url)
        .await
        .context("Failed to create database")?;

    let pool = create_pool(DatabaseConfig {
        url: database_url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool).await.context("Failed to run migrations")?;

    if let Some(existing) = User::find_by_email(&pool, &email).await? {
        tracing::info!(user_id = existing.id, %email, role = %existing.role, "Account already exists, nothing to do");
        close_pool(pool).await;
        return Ok(());
    }

    let password_hash = hash_password(&password).context("Failed to hash password")?;

    let admin = User::create(
        &pool,
        CreateUser {
            name,
            email,
            password_hash,
            role: UserRole::Admin,
        },
    )
    .await
    .context("Failed to create admin user")?;

    tracing::info!(user_id = admin.id, email = %admin.email, "Admin user created");

    close_pool(pool).await;
    Ok(())
}
