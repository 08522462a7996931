//! The process-owned auth context.
//!
//! One `AuthContext` is created at application start and injected into every
//! consumer; there is no global mutable state. It is torn down with the
//! process.

use std::sync::Arc;

use crate::auth::CredentialService;
use crate::config::ConfigV1;
use crate::oauth::PopupController;
use crate::session::SessionManager;
use crate::state::AuthStateMachine;
use crate::store::Store;

/// Everything the rest of the application needs to drive authentication.
#[derive(Clone)]
pub struct AuthContext {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Persisted credential storage (one local profile).
    pub store: Arc<dyn Store>,
    /// Session-id / active-user-id lifecycle.
    pub session: Arc<SessionManager>,
    /// The auth state machine; the single source of truth for "who is
    /// logged in".
    pub machine: Arc<AuthStateMachine>,
    /// Login/signup/logout and authenticated-request helpers.
    pub credentials: Arc<CredentialService>,
    /// OAuth callback handling for the popup/redirect target context.
    pub popup: Arc<PopupController>,
}
