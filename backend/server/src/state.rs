use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::{
    config::{Config, StoreBackend},
    database::{RedisStore, init_redis},
    memory::MemoryStore,
    store::SharedStore,
};

/// Built once at startup and handed to every handler through axum state.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let store: SharedStore = match config.store_backend {
            StoreBackend::Redis => {
                info!("Connecting to Redis...");
                Arc::new(RedisStore::new(init_redis(&config.redis_url).await?))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store, data is lost on restart");
                Arc::new(MemoryStore::default())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: SharedStore) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
