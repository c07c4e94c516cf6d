use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Argon2Hasher, InMemorySessionStore, JwtKeys, SessionStore, TokenVerifier};
use crate::config::{AppConfig, StorageBackend};
use crate::database::{DatabaseError, DatabaseManager};
use crate::services::{Deadline, Services, Stores};

/// What `/health` probes
#[derive(Clone)]
pub enum StorageHealth {
    Memory,
    Postgres(PgPool),
}

impl StorageHealth {
    pub fn name(&self) -> &'static str {
        match self {
            StorageHealth::Memory => "memory",
            StorageHealth::Postgres(_) => "postgres",
        }
    }

    pub async fn check(&self) -> Result<(), DatabaseError> {
        match self {
            StorageHealth::Memory => Ok(()),
            StorageHealth::Postgres(pool) => DatabaseManager::health_check(pool).await,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub verifier: Arc<dyn TokenVerifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub storage: StorageHealth,
    /// Budget shared by the store calls of one request
    pub deadline: Deadline,
}

impl AppState {
    /// Wire stores, auth and services for the configured backend.
    ///
    /// For Postgres this connects the pool and creates missing tables.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let keys = JwtKeys::from_config(&config.security)?;

        let (stores, storage) = match config.storage.backend {
            StorageBackend::Memory => (Stores::memory(), StorageHealth::Memory),
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                DatabaseManager::ensure_schema(&pool).await?;
                (Stores::postgres(pool.clone()), StorageHealth::Postgres(pool))
            }
        };
        tracing::info!("Using {} storage", storage.name());

        Ok(Self::new(stores, storage, keys, config))
    }

    pub fn new(stores: Stores, storage: StorageHealth, keys: JwtKeys, config: &AppConfig) -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let services = Services::new(
            stores,
            Arc::new(Argon2Hasher::new()),
            sessions.clone(),
            keys.clone(),
            config.security.single_session,
            config.api.request_timeout(),
        );

        Self {
            services,
            verifier: Arc::new(keys),
            sessions,
            storage,
            deadline: Deadline::new(config.api.request_timeout()),
        }
    }
}
