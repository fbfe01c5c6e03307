use serde::Deserialize;
use std::time::Duration;

use crate::infrastructure::rate_limit::RateLimitProfile;

/// Secret used when none is configured; accepted only with a startup warning
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Longest accepted token lifetime, ten years
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365 * 10;

/// Longest accepted revocation cache grace, seven days
pub const MAX_REVOCATION_GRACE_SECS: u64 = 7 * 24 * 3600;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub revocation_cache: RevocationCacheConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    /// Requests still running after this many seconds are answered with 408
    pub request_timeout_secs: u64,
    /// Larger request bodies are rejected with 413
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    /// Deadline for each revocation or user lookup made while authenticating
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Applied to every request
    pub default: RateLimitProfile,
    /// Applied additionally to login and registration
    pub strict: RateLimitProfile,
    pub sweep_interval_secs: u64,
    /// Clients idle for longer than this lose their bucket
    pub max_idle_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevocationCacheConfig {
    pub sweep_interval_secs: u64,
    /// How long past its token's expiry an entry survives the sweep
    pub grace_secs: u64,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; in-memory stores are used when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            trust_forwarded_for: false,
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 168,
            store_timeout_ms: 5000,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[hidden]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: RateLimitProfile::new(100.0, 200),
            strict: RateLimitProfile::per_minute(1.0, 5),
            sweep_interval_secs: 600,
            max_idle_secs: 3600,
        }
    }
}

impl Default for RevocationCacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            grace_secs: 600,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[hidden]"))
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(bounded_i64(self.token_ttl_hours, MAX_TOKEN_TTL_HOURS))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }
}

impl RevocationCacheConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(bounded_i64(self.grace_secs, MAX_REVOCATION_GRACE_SECS))
    }
}

/// `value` capped at `max`; `validate` rejects anything above the cap
fn bounded_i64(value: u64, max: u64) -> i64 {
    i64::try_from(value.min(max)).unwrap_or(i64::MAX)
}

impl AppConfig {
    /// Load `config/default`, then `config/local`, then the optional `extra`
    /// file, then `APP__*` environment variables, each layer overriding the
    /// previous one
    pub fn load_from(extra: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject values that would make the service misbehave at runtime
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let invalid = |message: String| Err(config::ConfigError::Message(message));

        if self.auth.jwt_secret.is_empty() {
            return invalid("auth.jwt_secret must not be empty".to_string());
        }
        if self.server.request_timeout_secs == 0 || self.server.body_limit_bytes == 0 {
            return invalid(
                "server.request_timeout_secs and server.body_limit_bytes must be positive"
                    .to_string(),
            );
        }
        if self.auth.token_ttl_hours == 0 || self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return invalid(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            ));
        }
        if self.auth.store_timeout_ms == 0 {
            return invalid("auth.store_timeout_ms must be positive".to_string());
        }

        for (name, profile) in [
            ("default", &self.rate_limit.default),
            ("strict", &self.rate_limit.strict),
        ] {
            if !profile.is_valid() {
                return invalid(format!(
                    "rate_limit.{}.rate_per_second must be a non-negative number",
                    name
                ));
            }
        }

        if self.rate_limit.sweep_interval_secs == 0 || self.revocation_cache.sweep_interval_secs == 0
        {
            return invalid("sweep intervals must be positive".to_string());
        }
        if self.revocation_cache.grace_secs > MAX_REVOCATION_GRACE_SECS {
            return invalid(format!(
                "revocation_cache.grace_secs must be at most {}",
                MAX_REVOCATION_GRACE_SECS
            ));
        }

        Ok(())
    }
}
