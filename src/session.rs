//! Session identity management.
//!
//! A session is the pairing of a locally generated session id with the active
//! user's id, persisted independently of the token. It exists to detect
//! identity conflicts (two different accounts fighting over one profile)
//! without inspecting the token itself.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::keys;
use crate::store::Store;

/// Result of `validate_session`: invalid sessions carry a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionValidation {
    pub valid: bool,
    pub reason: Option<String>,
}

impl SessionValidation {
    fn valid() -> Self {
        SessionValidation {
            valid: true,
            reason: None,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        SessionValidation {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Reads and writes the session-id / active-user-id pair through the store.
pub struct SessionManager {
    store: Arc<dyn Store>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SessionManager { store }
    }

    /// Generates a session id that is unique with overwhelming probability:
    /// a random UUID joined with a monotonic millisecond timestamp.
    pub fn generate_session_id(&self) -> String {
        format!(
            "{}-{}",
            Uuid::new_v4().simple(),
            Utc::now().timestamp_millis()
        )
    }

    pub async fn set_session_id(&self, session_id: &str) -> Result<(), String> {
        self.store.set(keys::SESSION_ID, session_id).await
    }

    pub async fn get_session_id(&self) -> Result<Option<String>, String> {
        self.store.get(keys::SESSION_ID).await
    }

    pub async fn remove_session_id(&self) -> Result<(), String> {
        self.store.remove(keys::SESSION_ID).await
    }

    pub async fn set_active_user_id(&self, user_id: &str) -> Result<(), String> {
        self.store.set(keys::ACTIVE_USER_ID, user_id).await
    }

    pub async fn get_active_user_id(&self) -> Result<Option<String>, String> {
        self.store.get(keys::ACTIVE_USER_ID).await
    }

    pub async fn remove_active_user_id(&self) -> Result<(), String> {
        self.store.remove(keys::ACTIVE_USER_ID).await
    }

    /// A session is well-formed only when both halves are present. Richer
    /// conflict rules (e.g. expiry) belong here when they arrive; today a
    /// record with both halves is always valid.
    pub async fn validate_session(&self) -> SessionValidation {
        let session_id = match self.store.get(keys::SESSION_ID).await {
            Ok(v) => v,
            Err(e) => return SessionValidation::invalid(format!("Session read failed: {}", e)),
        };
        let active_user_id = match self.store.get(keys::ACTIVE_USER_ID).await {
            Ok(v) => v,
            Err(e) => return SessionValidation::invalid(format!("Session read failed: {}", e)),
        };

        if session_id.is_none() || active_user_id.is_none() {
            debug!(
                "Session validation failed: session_id present={}, active_user_id present={}",
                session_id.is_some(),
                active_user_id.is_some()
            );
            return SessionValidation::invalid("Missing session data");
        }

        SessionValidation::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_store::MemoryStore;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn generated_ids_are_unique() {
        let m = manager();
        let a = m.generate_session_id();
        let b = m.generate_session_id();
        assert_ne!(a, b);
        // random component + time component
        assert!(a.contains('-'));
    }

    #[tokio::test]
    async fn validate_requires_both_halves() {
        let m = manager();
        assert!(!m.validate_session().await.valid);

        m.set_session_id("s-1").await.unwrap();
        let half = m.validate_session().await;
        assert!(!half.valid);
        assert_eq!(half.reason.as_deref(), Some("Missing session data"));

        m.set_active_user_id("u-1").await.unwrap();
        assert!(m.validate_session().await.valid);

        m.remove_session_id().await.unwrap();
        assert!(!m.validate_session().await.valid);
    }

    #[tokio::test]
    async fn ids_round_trip_through_store() {
        let m = manager();
        m.set_session_id("s-9").await.unwrap();
        m.set_active_user_id("u-9").await.unwrap();
        assert_eq!(m.get_session_id().await.unwrap(), Some("s-9".into()));
        assert_eq!(m.get_active_user_id().await.unwrap(), Some("u-9".into()));

        m.remove_active_user_id().await.unwrap();
        assert_eq!(m.get_active_user_id().await.unwrap(), None);
    }
}
