//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `CATALOG_`, nested keys separated by `__`)
//! 2. A TOML file (`./config.toml` or an explicit path)
//! 3. Default values
//!
//! # Example
//!
//! ```bash
//! CATALOG_SERVICE__PORT=8080 CATALOG_AUTH__JWT_SECRET=hunter2 catalog serve
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CATALOG_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Populate the store with the demo catalog at startup
    #[serde(default)]
    pub seed_demo_data: bool,

    /// Service configuration
    pub service: ServiceConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// List endpoint bounds
    #[serde(default)]
    pub listing: ListingConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Database configuration (optional, in-memory storage when absent)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (development, test, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Token signing and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Optional `iss` claim set on issued tokens and required on verification
    #[serde(default)]
    pub issuer: Option<String>,

    /// Argon2 parameters
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Password hashing configuration
///
/// Defaults follow the OWASP minimum recommendation for Argon2id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    /// Number of iterations
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    /// Degree of parallelism
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// Minimum accepted password length
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

/// Page size bounds shared by every list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingConfig {
    /// Page size used when `limit` is missing or invalid
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Largest page size a client may request
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: "permissive", "restrictive" or "disabled"
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,

    /// Send hardening response headers
    #[serde(default = "default_true")]
    pub security_headers: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Apply bundled migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_secret() -> String {
    "secret".to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

fn default_memory_cost() -> u32 {
    19456
}

fn default_time_cost() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_min_password_length() -> usize {
    1
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    100
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_demo_data: false,
            service: ServiceConfig::default(),
            auth: AuthConfig::default(),
            listing: ListingConfig::default(),
            middleware: MiddlewareConfig::default(),
            database: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "catalog-service".to_string(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl(),
            issuer: None,
            password: PasswordConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: default_memory_cost(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
            min_password_length: default_min_password_length(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
            security_headers: true,
        }
    }
}

impl Config {
    /// Load configuration from `./config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
        } else {
            tracing::debug!("No configuration file at {}, using defaults", path.display());
        }

        let config: Config = Self::figment(path).extract()?;
        config.listing.validate()?;
        Ok(config)
    }

    /// Layered configuration sources, exposed for callers that add their own providers
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    /// Get the token lifetime as Duration
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl_secs)
    }

    /// Whether the service runs with production settings (JSON logs)
    pub fn is_production(&self) -> bool {
        self.service.environment.eq_ignore_ascii_case("production")
    }

    /// Request body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.middleware.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

impl ListingConfig {
    fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(crate::error::Error::Config(Box::new(figment::Error::from(
                "listing.default_limit and listing.max_limit must be positive".to_string(),
            ))));
        }
        if self.default_limit > self.max_limit {
            return Err(crate::error::Error::Config(Box::new(figment::Error::from(format!(
                "listing.default_limit ({}) exceeds listing.max_limit ({})",
                self.default_limit, self.max_limit
            )))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 3000);
        assert_eq!(config.service.environment, "development");
        assert_eq!(config.auth.jwt_secret, "secret");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.listing.default_limit, 10);
        assert_eq!(config.listing.max_limit, 100);
        assert!(config.database.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.service.port, 3000);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
seed_demo_data = true

[service]
name = "books"
port = 8081
environment = "production"

[auth]
jwt_secret = "s3cret"
token_ttl_secs = 60

[listing]
default_limit = 5
max_limit = 20

[database]
url = "postgres://localhost/catalog"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "books");
        assert_eq!(config.service.port, 8081);
        assert!(config.is_production());
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.token_ttl(), Duration::from_secs(60));
        assert_eq!(config.listing.default_limit, 5);
        assert!(config.seed_demo_data);

        let database = config.database.unwrap();
        assert_eq!(database.max_connections, 10);
        assert!(database.run_migrations);
    }

    #[test]
    fn test_default_limit_above_max_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listing]\ndefault_limit = 50\nmax_limit = 20").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_body_limit_bytes() {
        let config = Config::default();
        assert_eq!(config.body_limit_bytes(), 10 * 1024 * 1024);
    }
}
