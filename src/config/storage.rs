use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A wrapper for the storage configuration:
/// - backend: which concrete store holds the persisted credential slots.
/// - extra_sweep: additional key namespaces removed by the logout sweep.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub extra_sweep: Vec<String>,
}

/// The available storage backends, differentiated via a "type" tag in YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
#[serde(tag = "type")]
pub enum StorageBackend {
    #[serde(rename = "file")]
    File(FileStoreConfig),
    #[serde(rename = "memory")]
    Memory,
}

/// Config for the JSON-file store backend.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct FileStoreConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::Memory,
            extra_sweep: Vec::new(),
        }
    }
}
