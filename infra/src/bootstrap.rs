//! Startup wiring: backends and the validator registry
//!
//! Credentials go to MySQL when `database` is configured and stay in memory
//! otherwise; rate limits go to Redis when `cache` is configured. Every
//! enabled validator gets its own engine over the shared backends.

use std::sync::Arc;

use cv_core::{
    CredentialStore, InMemoryCredentialStore, InMemoryRateLimiter, MethodConfig, RateLimiter,
    ValidatorRegistry, VerificationEngine,
};
use cv_shared::{AppConfig, ValidatorSettings};

use crate::normalizer::create_normalizer;
use crate::sender::{create_sender, MessageTemplates};
use crate::InfrastructureError;

/// Storage and throttling shared by all validators
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn CredentialStore>,
    pub limiter: Arc<dyn RateLimiter>,
}

impl Backends {
    /// Process-local backends
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryCredentialStore::new()),
            limiter: Arc::new(InMemoryRateLimiter::new()),
        }
    }
}

/// Connect the configured storage and rate limiting backends
pub async fn connect_backends(config: &AppConfig) -> Result<Backends, InfrastructureError> {
    let store: Arc<dyn CredentialStore> = match &config.database {
        Some(database) => connect_store(database).await?,
        None => {
            if config.environment.is_production() {
                tracing::warn!(
                    event = "memory_store_in_production",
                    "No database configured; credentials will not survive a restart"
                );
            }
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let limiter: Arc<dyn RateLimiter> = match &config.cache {
        Some(cache) => connect_limiter(cache).await?,
        None => Arc::new(InMemoryRateLimiter::new()),
    };

    Ok(Backends { store, limiter })
}

#[cfg(feature = "mysql")]
async fn connect_store(
    database: &cv_shared::DatabaseConfig,
) -> Result<Arc<dyn CredentialStore>, InfrastructureError> {
    use crate::database::{DatabasePool, MySqlCredentialStore};

    let pool = DatabasePool::new(database).await?;
    pool.run_migrations().await?;
    Ok(Arc::new(MySqlCredentialStore::new(pool.get_pool().clone())))
}

#[cfg(not(feature = "mysql"))]
async fn connect_store(
    _database: &cv_shared::DatabaseConfig,
) -> Result<Arc<dyn CredentialStore>, InfrastructureError> {
    Err(InfrastructureError::Config(
        "database is configured but the mysql feature is disabled".to_string(),
    ))
}

#[cfg(feature = "redis-cache")]
async fn connect_limiter(
    cache: &cv_shared::CacheConfig,
) -> Result<Arc<dyn RateLimiter>, InfrastructureError> {
    use crate::cache::{RedisClient, RedisRateLimiter};

    let client = RedisClient::new(cache.clone()).await?;
    Ok(Arc::new(RedisRateLimiter::new(Arc::new(client))))
}

#[cfg(not(feature = "redis-cache"))]
async fn connect_limiter(
    _cache: &cv_shared::CacheConfig,
) -> Result<Arc<dyn RateLimiter>, InfrastructureError> {
    Err(InfrastructureError::Config(
        "cache is configured but the redis-cache feature is disabled".to_string(),
    ))
}

/// Reject settings that must never reach production
fn check_settings(
    config: &AppConfig,
    method: &str,
    settings: &ValidatorSettings,
) -> Result<(), InfrastructureError> {
    let method_config = MethodConfig::from_json(&settings.config_json())
        .map_err(|e| InfrastructureError::Config(format!("Validator '{}': {}", method, e)))?;

    if method_config.accept_any_response && config.environment.is_production() {
        return Err(InfrastructureError::Config(format!(
            "Validator '{}': accept_any_response is not allowed in production",
            method
        )));
    }
    if settings.provider == "mock" && config.environment.is_production() {
        tracing::warn!(
            method = %method,
            event = "mock_provider_in_production",
            "Validator delivers through the mock provider"
        );
    }
    Ok(())
}

/// Build the registry over already connected backends
pub fn build_registry_with(
    config: &AppConfig,
    backends: &Backends,
) -> Result<ValidatorRegistry, InfrastructureError> {
    let mut enabled: Vec<(&String, &ValidatorSettings)> = config.enabled_validators().collect();
    enabled.sort_by(|a, b| a.0.cmp(b.0));

    let mut builder = ValidatorRegistry::builder();
    for (method, settings) in enabled {
        check_settings(config, method, settings)?;

        let mut templates = MessageTemplates::default();
        if let Some(reset_url) = &settings.reset_url {
            templates = templates.with_reset_url(reset_url.clone());
        }

        let engine = VerificationEngine::new(
            method.clone(),
            backends.store.clone(),
            backends.limiter.clone(),
            create_sender(&settings.provider, templates)?,
            create_normalizer(&settings.normalizer)?,
        );

        builder = builder
            .register(Arc::new(engine), &settings.config_json())
            .map_err(|e| InfrastructureError::Config(e.to_string()))?;
    }

    let registry = builder.build();
    tracing::info!(
        methods = ?registry.methods(),
        environment = %config.environment,
        event = "registry_built",
        "Validator registry ready"
    );
    Ok(registry)
}

/// Connect backends and build the registry from configuration
pub async fn build_registry(config: &AppConfig) -> Result<ValidatorRegistry, InfrastructureError> {
    let backends = connect_backends(config).await?;
    build_registry_with(config, &backends)
}
