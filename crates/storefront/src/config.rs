//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`); not needed when `STOREFRONT_STORAGE=memory`
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 5000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:5000`)
//! - `STOREFRONT_TOKEN_TRANSPORT` - `header`, `cookie` or `both` (default: cookie)
//! - `STOREFRONT_STORAGE` - `postgres` or `memory` (default: postgres)
//! - `STOREFRONT_UPLOADS_DIR` - Directory for product images (default: uploads)
//! - `STOREFRONT_CORS_ORIGIN` - Allowed CORS origin (default: any)
//! - `STOREFRONT_RATE_LIMIT` - Rate limit register/login (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where the authenticator looks for a token, and how tokens are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenTransport {
    /// `Authorization` header; token returned in the response body.
    Header,
    /// `token` cookie set by the server.
    #[default]
    Cookie,
    /// Both. The header wins when a request carries both.
    Both,
}

impl TokenTransport {
    /// Whether the `Authorization` header is read and the token returned in bodies.
    #[must_use]
    pub const fn uses_header(self) -> bool {
        matches!(self, Self::Header | Self::Both)
    }

    /// Whether the `token` cookie is read and set.
    #[must_use]
    pub const fn uses_cookie(self) -> bool {
        matches!(self, Self::Cookie | Self::Both)
    }
}

impl FromStr for TokenTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            "both" => Ok(Self::Both),
            other => Err(format!("expected header, cookie or both, got '{other}'")),
        }
    }
}

/// Which `Store` implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected postgres or memory, got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Token transport
    pub token_transport: TokenTransport,
    /// Storage backend
    pub storage: StorageBackend,
    /// Directory product images are written to and served from
    pub uploads_dir: PathBuf,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
    /// Whether register/login are rate limited per client IP
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage: StorageBackend = parse_env("STOREFRONT_STORAGE", "postgres")?;
        let database_url = match storage {
            StorageBackend::Postgres => Some(get_database_url("STOREFRONT_DATABASE_URL")?),
            StorageBackend::Memory => None,
        };
        let host: IpAddr = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port: u16 = parse_env("STOREFRONT_PORT", "5000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:5000");
        let jwt_secret = get_validated_secret("STOREFRONT_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "STOREFRONT_JWT_SECRET")?;
        let token_transport = parse_env("STOREFRONT_TOKEN_TRANSPORT", "cookie")?;
        let uploads_dir = PathBuf::from(get_env_or_default("STOREFRONT_UPLOADS_DIR", "uploads"));
        let cors_origin = get_optional_env("STOREFRONT_CORS_ORIGIN");
        let rate_limit = parse_env("STOREFRONT_RATE_LIMIT", "true")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            token_transport,
            storage,
            uploads_dir,
            cors_origin,
            rate_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for a process-local instance backed by the memory store.
    ///
    /// Used by tests and local tooling; rate limiting is off.
    #[must_use]
    pub fn in_memory(jwt_secret: SecretString, uploads_dir: PathBuf) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_owned(),
            jwt_secret,
            token_transport: TokenTransport::default(),
            storage: StorageBackend::Memory,
            uploads_dir,
            cors_origin: None,
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether issued cookies carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that the signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
