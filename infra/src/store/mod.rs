//! Verification record stores
//!
//! Both stores implement `VerificationStore` and `AttemptTracker` from
//! `sv_core`. The backend is chosen by `store.backend` in the application
//! configuration.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use chrono::Duration;
use std::sync::Arc;

use sv_core::services::verification::{AttemptTracker, VerificationStore};
use sv_shared::config::{StoreBackend, StoreConfig, VerificationConfig};

use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Store and attempt tracker handed to the verification service
#[derive(Clone)]
pub struct StoreHandles {
    pub store: Arc<dyn VerificationStore>,
    pub attempts: Arc<dyn AttemptTracker>,
}

/// Build the configured store
///
/// The memory backend starts its sweeper task, so this must run inside a
/// tokio runtime.
pub async fn build_store(
    config: &StoreConfig,
    verification: &VerificationConfig,
) -> Result<StoreHandles, InfrastructureError> {
    let retention = Duration::seconds(verification.expired_retention_seconds);

    match config.backend {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new(retention));
            store.spawn_sweeper(std::time::Duration::from_secs(config.sweep_interval_seconds));
            tracing::info!(backend = "memory", "Verification store ready");

            Ok(StoreHandles {
                store: store.clone(),
                attempts: store,
            })
        }
        StoreBackend::Redis => {
            let client = RedisClient::new(config.cache.clone()).await?;
            let store = Arc::new(RedisStore::new(client, retention));
            tracing::info!(backend = "redis", "Verification store ready");

            Ok(StoreHandles {
                store: store.clone(),
                attempts: store,
            })
        }
    }
}
