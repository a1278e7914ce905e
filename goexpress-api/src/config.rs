/// Configuration management for the API server
///
/// Configuration is read once at startup from environment variables (after
/// loading `.env`, if present) into an immutable [`Config`] shared by all
/// handlers.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string
/// - `DATABASE_MAX_CONNECTIONS` / `DATABASE_MIN_CONNECTIONS`: Pool bounds (default: 10 / 1)
/// - `JWT_SECRET`: Access token signing key (required, at least 32 characters)
/// - `JWT_REFRESH_SECRET`: Refresh token signing key (required, different from `JWT_SECRET`)
/// - `JWT_ACCESS_TTL_MINUTES`: Access token lifetime (default: 1440)
/// - `JWT_REFRESH_TTL_DAYS`: Refresh token lifetime (default: 7)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `ENVIRONMENT`: Deployment name (default: development)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUN_MIGRATIONS`: Apply migrations on startup (default: true)
///
/// # Example
///
/// ```no_run
/// use goexpress_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use goexpress_shared::db::pool::{DatabaseConfig as PoolConfig, DEFAULT_DATABASE_URL};

/// Minimum length of a token signing secret
const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_origins: Vec<String>,

    /// Deployment name, e.g. `development` or `production`
    pub environment: String,

    pub log_format: LogFormat,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored
    Pretty,

    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Access token signing key
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Refresh token signing key, distinct from `secret`
    pub refresh_secret: String,

    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        let jwt_refresh_secret = lookup("JWT_REFRESH_SECRET")
            .context("JWT_REFRESH_SECRET environment variable is required")?;

        if jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LENGTH);
        }
        if jwt_refresh_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_REFRESH_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            );
        }
        if jwt_secret == jwt_refresh_secret {
            anyhow::bail!("JWT_REFRESH_SECRET must differ from JWT_SECRET");
        }

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: parse(&var("PORT", "8080"), "PORT")?,
                cors_origins,
                environment: var("ENVIRONMENT", "development"),
                log_format: var("LOG_FORMAT", "pretty").parse()?,
                run_migrations: parse(&var("RUN_MIGRATIONS", "true"), "RUN_MIGRATIONS")?,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: parse(
                    &var("DATABASE_MAX_CONNECTIONS", "10"),
                    "DATABASE_MAX_CONNECTIONS",
                )?,
                min_connections: parse(
                    &var("DATABASE_MIN_CONNECTIONS", "1"),
                    "DATABASE_MIN_CONNECTIONS",
                )?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                refresh_secret: jwt_refresh_secret,
                access_ttl_minutes: parse(
                    &var("JWT_ACCESS_TTL_MINUTES", "1440"),
                    "JWT_ACCESS_TTL_MINUTES",
                )?,
                refresh_ttl_days: parse(&var("JWT_REFRESH_TTL_DAYS", "7"), "JWT_REFRESH_TTL_DAYS")?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn is_production(&self) -> bool {
        self.api.environment.eq_ignore_ascii_case("production")
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            ..Default::default()
        }
    }
}

fn parse<T>(value: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: '{}'", key, value))
}
