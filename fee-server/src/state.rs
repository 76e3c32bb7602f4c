//! Application state for the fee server

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{Config, StoreBackend};
use crate::db::{FeeComponentStore, LedgerStore, MemoryStore, PgStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub fees: Arc<dyn FeeComponentStore>,
    pub ledger: Arc<dyn LedgerStore>,
    /// Never logged
    pub gateway_secret: Arc<str>,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set for the postgres store backend")?;
                let pool = PgPool::connect(url).await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("PostgreSQL store ready");
                let store = Arc::new(PgStore::new(pool));
                Ok(Self::with_store(store, &config.gateway_key_secret))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on exit");
                Ok(Self::with_store(
                    Arc::new(MemoryStore::new()),
                    &config.gateway_key_secret,
                ))
            }
        }
    }

    /// One object serving both store roles
    pub fn with_store<S>(store: Arc<S>, gateway_secret: &str) -> Self
    where
        S: FeeComponentStore + LedgerStore + 'static,
    {
        Self {
            fees: store.clone(),
            ledger: store,
            gateway_secret: Arc::from(gateway_secret),
        }
    }
}
