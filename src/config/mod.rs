//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DEFAULT_JWT_SECRET, DatabaseConfig, LogFormat, LoggingConfig,
    RateLimitConfig, RevocationCacheConfig, ServerConfig,
};
