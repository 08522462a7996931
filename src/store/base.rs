use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::file_store::FileStore;
use super::memory_store::MemoryStore;
use crate::config::{StorageBackend, StorageConfig};

/// The Store trait abstracts the string-keyed credential storage that backs
/// the whole crate (the equivalent of one browser profile's local storage).
///
/// The store is a shared mutable resource across browsing contexts
/// (opener + popup). Writes are last-write-wins; callers must not rely on
/// read-after-write consistency across contexts.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    async fn set(&self, key: &str, value: &str) -> Result<(), String>;
    async fn remove(&self, key: &str) -> Result<(), String>;
    /// Every key currently present, for the logout sweep.
    async fn keys(&self) -> Result<Vec<String>, String>;
}

/// Creates a concrete store implementation based on the StorageConfig.
pub fn create_store(config: &StorageConfig) -> Arc<dyn Store> {
    match &config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory credential store (nothing persists).");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File(file_config) => match FileStore::new(&file_config.path) {
            Ok(store) => {
                info!("Using file credential store at '{}'.", file_config.path);
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to open credential store: {}", e);
                std::process::exit(1);
            }
        },
    }
}
