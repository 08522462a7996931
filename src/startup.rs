//! Context construction and the startup initialization order.
//!
//! Initialization is strictly: read persisted credentials → validate the
//! session → apply the first state transition. A failed validation or an
//! unreadable user blob forces a logout, so the process never starts with a
//! half-usable session.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::CredentialService;
use crate::config::ConfigV1;
use crate::context::AuthContext;
use crate::keys;
use crate::models::User;
use crate::oauth::PopupController;
use crate::session::SessionManager;
use crate::state::{AuthAction, AuthStateMachine};
use crate::store::create_store;

/// Wires up the store, session manager, state machine, and services.
pub fn build_context(config: Arc<ConfigV1>) -> AuthContext {
    let store = create_store(&config.storage);
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

/// Reads persisted state and applies the first transition. Fired once per
/// process; later calls are no-ops because `Init` is only legal before the
/// machine leaves its loading states.
pub async fn initialize(ctx: &AuthContext) {
    debug!("Initializing auth state from persisted storage");
    ctx.machine.begin_loading();

    let token = ctx.store.get(keys::AUTH_TOKEN).await.unwrap_or(None);
    let raw_user = ctx.store.get(keys::USER_DATA).await.unwrap_or(None);

    let (Some(token), Some(raw_user)) = (token, raw_user) else {
        debug!("No persisted credentials; starting unauthenticated");
        ctx.machine.dispatch(AuthAction::Init {
            user: None,
            token: None,
        });
        return;
    };

    let user = match serde_json::from_str::<User>(&raw_user) {
        Ok(user) => user,
        Err(e) => {
            error!("Persisted user profile is unreadable: {}; forcing logout", e);
            ctx.credentials.logout(None).await;
            return;
        }
    };

    let validation = ctx.session.validate_session().await;
    if !validation.valid {
        warn!(
            "Session validation failed: {}; forcing logout",
            validation.reason.as_deref().unwrap_or("unknown")
        );
        ctx.credentials.logout(None).await;
        return;
    }

    info!("Restoring authenticated session for '{}'", user.username);
    ctx.machine.dispatch(AuthAction::Init {
        user: Some(user),
        token: Some(token),
    });
}
