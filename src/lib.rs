//! Patwos API
//!
//! Account service with bearer-token authentication:
//! - HS256 tokens with durable, cached revocation on logout
//! - Per-client token bucket admission with a strict profile for credentials
//! - In-memory or PostgreSQL account and revocation stores

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{RevocationStore, UserRepository};
use infrastructure::{
    auth::{JwtConfig, JwtService, RevocationCache, TokenAuthenticator},
    rate_limit::ClientLimiterRegistry,
    revocation::{InMemoryRevocationStore, PostgresRevocationStore},
    storage::{PostgresConfig, PostgresMigrator, auth_migrations, connect},
    tasks::{BackgroundTasks, Sweep},
    user::{Argon2Hasher, AuthService, InMemoryUserRepository, PasswordHasher, PostgresUserRepository},
};
use tracing::info;

/// Shared state plus the components that need periodic sweeping
#[derive(Debug, Clone)]
pub struct Application {
    pub state: AppState,
    pub revocation_cache: Arc<RevocationCache>,
    /// Set when revocations live in process memory
    pub revocation_store: Option<Arc<InMemoryRevocationStore>>,
}

impl Application {
    /// Start one sweeper per swept component
    pub fn spawn_sweepers(&self, config: &AppConfig, tasks: &mut BackgroundTasks) {
        let cache_interval = config.revocation_cache.sweep_interval();
        let limiter_interval = config.rate_limit.sweep_interval();

        tasks.spawn_sweeper(self.revocation_cache.clone(), cache_interval);
        tasks.spawn_sweeper(self.state.default_limiter.clone(), limiter_interval);
        tasks.spawn_sweeper(self.state.strict_limiter.clone(), limiter_interval);

        if let Some(store) = &self.revocation_store {
            let target: Arc<dyn Sweep> = store.clone();
            tasks.spawn_sweeper(target, cache_interval);
        }
    }
}

/// Build the application from configuration, connecting to PostgreSQL when
/// `database.url` is set
pub async fn build_application(config: &AppConfig) -> anyhow::Result<Application> {
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());

    let Some(url) = config.database.url.as_deref() else {
        info!("Storage backend: in-memory");
        let users = Arc::new(InMemoryUserRepository::new());
        let revocations = Arc::new(InMemoryRevocationStore::new());
        let mut app = build_application_with_stores(config, users, revocations.clone(), hasher);
        app.revocation_store = Some(revocations);
        return Ok(app);
    };

    info!("Storage backend: PostgreSQL");
    let pg_config = PostgresConfig::new(url)
        .with_max_connections(config.database.max_connections)
        .with_min_connections(config.database.min_connections);
    let pool = connect(&pg_config).await?;

    let applied = PostgresMigrator::new(pool.clone())
        .run(&auth_migrations())
        .await?;
    info!(applied, "Database schema ready");

    let revocations = PostgresRevocationStore::new(pool.clone());
    let purged = revocations.purge_expired().await?;
    info!(purged, "Expired revocations purged");

    Ok(build_application_with_stores(
        config,
        Arc::new(PostgresUserRepository::new(pool)),
        Arc::new(revocations),
        hasher,
    ))
}

/// Wire the services over the given stores
pub fn build_application_with_stores(
    config: &AppConfig,
    users: Arc<dyn UserRepository>,
    revocations: Arc<dyn RevocationStore>,
    hasher: Arc<dyn PasswordHasher>,
) -> Application {
    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl(),
    )));
    let revocation_cache = Arc::new(RevocationCache::new(config.revocation_cache.grace()));

    let authenticator = Arc::new(TokenAuthenticator::new(
        jwt.clone(),
        revocation_cache.clone(),
        revocations.clone(),
        users.clone(),
        config.auth.store_timeout(),
    ));
    let auth_service = AuthService::new(users, hasher, jwt, revocations, revocation_cache.clone())
        .with_store_timeout(config.auth.store_timeout());

    let default_limiter = Arc::new(ClientLimiterRegistry::new(
        "default",
        config.rate_limit.default,
        config.rate_limit.max_idle(),
    ));
    let strict_limiter = Arc::new(ClientLimiterRegistry::new(
        "strict",
        config.rate_limit.strict,
        config.rate_limit.max_idle(),
    ));

    let state = AppState::new(
        authenticator,
        Arc::new(auth_service),
        default_limiter,
        strict_limiter,
    )
        .with_trust_forwarded_for(config.server.trust_forwarded_for)
        .with_request_limits(config.server.request_timeout(), config.server.body_limit_bytes);

    Application {
        state,
        revocation_cache,
        revocation_store: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_application_spawns_all_sweepers() {
        let config = AppConfig::default();
        let app = build_application(&config).await.unwrap();
        assert!(app.revocation_store.is_some());

        let mut tasks = BackgroundTasks::new();
        app.spawn_sweepers(&config, &mut tasks);
        assert_eq!(tasks.len(), 4);

        tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_limiters_follow_configured_profiles() {
        let config = AppConfig::default();
        let app = build_application(&config).await.unwrap();

        assert_eq!(app.state.default_limiter.profile(), &config.rate_limit.default);
        assert_eq!(app.state.strict_limiter.profile(), &config.rate_limit.strict);
        assert_eq!(app.state.strict_limiter.name(), "strict");
    }
}
