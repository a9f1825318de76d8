// src/config.rs

use std::env;
use std::fmt;
use std::net::SocketAddr;

use dotenvy::dotenv;
use url::Url;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub log_dir: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    /// Remote `/api/auth/me` endpoint. `None` resolves tokens locally.
    pub identity_url: Option<Url>,
    pub identity_timeout_secs: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub cors_origins: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let bind_addr = parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let db_max_connections = parsed("DB_MAX_CONNECTIONS", 16)?;
        let identity_timeout_secs = parsed("IDENTITY_TIMEOUT_SECS", 5)?;

        let identity_url = match optional("IDENTITY_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                key: "IDENTITY_URL",
                reason: e.to_string(),
            })?),
            None => None,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            log_dir,
            bind_addr,
            db_max_connections,
            identity_url,
            identity_timeout_secs,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
            cors_origins,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match optional(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
