use std::sync::Arc;

use authkeeper::auth::CredentialService;
use authkeeper::config::{ApiConfig, ConfigV1, LoggingConfig, ProviderConfig, StorageConfig};
use authkeeper::context::AuthContext;
use authkeeper::oauth::PopupController;
use authkeeper::session::SessionManager;
use authkeeper::state::AuthStateMachine;
use authkeeper::store::memory_store::MemoryStore;
use authkeeper::store::Store;

/// Config pointed at a mockito server, with an in-memory store.
pub fn test_config(base_url: &str) -> ConfigV1 {
    ConfigV1 {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_in_ms: 2_000,
        },
        provider: ProviderConfig {
            name: "tiktok".to_string(),
            dashboard_path: "/dashboard".to_string(),
            login_path: "/auth/login".to_string(),
        },
        storage: StorageConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Builds a full context around the given store so tests can pre-seed or
/// wrap storage.
pub fn build_context_with_store(base_url: &str, store: Arc<dyn Store>) -> AuthContext {
    let config = Arc::new(test_config(base_url));
    let session = Arc::new(SessionManager::new(store.clone()));
    let machine = Arc::new(AuthStateMachine::new());
    let credentials = Arc::new(CredentialService::new(
        config.clone(),
        store.clone(),
        session.clone(),
        machine.clone(),
    ));
    let popup = Arc::new(PopupController::new(config.clone(), store.clone()));

    AuthContext {
        config,
        store,
        session,
        machine,
        credentials,
        popup,
    }
}

pub fn build_context(base_url: &str) -> AuthContext {
    build_context_with_store(base_url, Arc::new(MemoryStore::new()))
}

/// A login response body for the given user.
pub fn login_body(id: &str, email: &str, username: &str, token: &str) -> String {
    serde_json::json!({
        "access_token": token,
        "user": {
            "id": id,
            "email": email,
            "username": username,
            "full_name": "Test User"
        }
    })
    .to_string()
}
