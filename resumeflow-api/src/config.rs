/// Configuration management for the API server
///
/// Configuration is read once at start-up from environment variables
/// (optionally seeded from a `.env` file) and never changes afterwards.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (falls back to `PORT`, default: 3000)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECONDS`: Wait for a free connection (default: 30)
/// - `DATABASE_TRANSACTION_TIMEOUT_SECONDS`: Limit for atomic sequences (default: 5)
/// - `JWT_SECRET`: Access token signing secret (required, >= 32 chars)
/// - `JWT_REFRESH_SECRET`: Refresh token signing secret (required, >= 32 chars)
/// - `ACCESS_TOKEN_TTL_SECONDS`: Access token lifetime (default: 43200, 12h)
/// - `REFRESH_TOKEN_TTL_SECONDS`: Refresh token lifetime (default: 604800, 7d)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use resumeflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use resumeflow_shared::auth::jwt::TokenService;
use resumeflow_shared::db::pool::DatabaseConfig;
use std::fmt;
use std::str::FromStr;

/// Shortest accepted signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signs access tokens. Generate with `openssl rand -hex 32`.
    pub access_secret: String,

    /// Signs refresh tokens; must differ from `access_secret` in production
    pub refresh_secret: String,

    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl JwtConfig {
    pub fn token_service(&self) -> TokenService {
        TokenService::new(
            self.access_secret.clone(),
            self.refresh_secret.clone(),
            chrono::Duration::seconds(self.access_ttl_seconds),
            chrono::Duration::seconds(self.refresh_ttl_seconds),
        )
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("API_PORT").or_else(|| lookup("PORT")) {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("API_PORT is not a valid port: {}", value))?,
            None => 3000,
        };
        let cors_origins = lookup("CORS_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let url = lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            acquire_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                defaults.acquire_timeout_seconds,
            )?,
            transaction_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_TRANSACTION_TIMEOUT_SECONDS",
                defaults.transaction_timeout_seconds,
            )?,
            ..defaults
        };

        let access_secret = required_secret(&lookup, "JWT_SECRET")?;
        let refresh_secret = required_secret(&lookup, "JWT_REFRESH_SECRET")?;
        let access_ttl_seconds = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 12 * 60 * 60)?;
        let refresh_ttl_seconds = parse_or(&lookup, "REFRESH_TOKEN_TTL_SECONDS", 7 * 24 * 60 * 60)?;

        if access_ttl_seconds <= 0 || refresh_ttl_seconds <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database,
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl_seconds,
                refresh_ttl_seconds,
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup(key).with_context(|| format!("{} environment variable is required", key))?;

    if secret.len() < MIN_SECRET_LENGTH {
        anyhow::bail!("{} must be at least {} characters long", key, MIN_SECRET_LENGTH);
    }

    Ok(secret)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}
