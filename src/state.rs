//! The auth state machine.
//!
//! `AuthState` is the single source of truth for "who is logged in". All
//! mutation flows through `AuthStateMachine::dispatch`, a reducer applied in
//! dispatch order, so there is no concurrent-write hazard on the state
//! itself. Consumers (route guards, request helpers) read reactively through
//! a watch subscription.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::User;

/// Lifecycle phase of the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Process start; nothing read from storage yet.
    Uninitialized,
    /// Startup has begun reading persisted state but has not applied it.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Invariant: `status == Authenticated` exactly when both `user` and `token`
/// are present. The reducer below is the only writer.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthState {
    fn initial() -> Self {
        AuthState {
            status: AuthStatus::Uninitialized,
            user: None,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, AuthStatus::Uninitialized | AuthStatus::Loading)
    }
}

/// The only legal mutations. `LoginSuccess` carries both halves of the
/// credential by construction, which is what enforces the Authenticated
/// invariant.
#[derive(Debug, Clone)]
pub enum AuthAction {
    /// Startup transition, fired once after persisted state is read and the
    /// session validated. Both-present means Authenticated.
    Init {
        user: Option<User>,
        token: Option<String>,
    },
    LoginSuccess {
        user: User,
        token: String,
    },
    Logout,
}

/// Holds the current `AuthState` and publishes every change to subscribers.
pub struct AuthStateMachine {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateMachine {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::initial());
        AuthStateMachine { tx }
    }

    /// A snapshot of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// A live subscription; protected-route guards hang off this.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Marks the start of initialization. Legal only from `Uninitialized`.
    pub fn begin_loading(&self) {
        self.tx.send_if_modified(|state| {
            if state.status != AuthStatus::Uninitialized {
                return false;
            }
            state.status = AuthStatus::Loading;
            true
        });
    }

    /// Applies an action. Actions that do not match the transition table are
    /// ignored with a warning rather than corrupting state.
    pub fn dispatch(&self, action: AuthAction) {
        self.tx.send_if_modified(|state| match action {
            AuthAction::Init { user, token } => {
                if !matches!(state.status, AuthStatus::Uninitialized | AuthStatus::Loading) {
                    warn!(
                        "Ignoring Init action in status {:?}; already initialized",
                        state.status
                    );
                    return false;
                }
                let authenticated = user.is_some() && token.is_some();
                state.status = if authenticated {
                    AuthStatus::Authenticated
                } else {
                    AuthStatus::Unauthenticated
                };
                state.user = if authenticated { user } else { None };
                state.token = if authenticated { token } else { None };
                debug!("Auth state initialized: {:?}", state.status);
                true
            }
            AuthAction::LoginSuccess { user, token } => {
                state.status = AuthStatus::Authenticated;
                state.user = Some(user);
                state.token = Some(token);
                debug!("Auth state: login success");
                true
            }
            AuthAction::Logout => {
                state.status = AuthStatus::Unauthenticated;
                state.user = None;
                state.token = None;
                debug!("Auth state: logged out");
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new("u-1", email, "someone")
    }

    #[test]
    fn starts_uninitialized() {
        let machine = AuthStateMachine::new();
        let state = machine.snapshot();
        assert_eq!(state.status, AuthStatus::Uninitialized);
        assert!(state.user.is_none() && state.token.is_none());
    }

    #[test]
    fn init_with_both_is_authenticated() {
        let machine = AuthStateMachine::new();
        machine.begin_loading();
        machine.dispatch(AuthAction::Init {
            user: Some(user("a@x.com")),
            token: Some("tok".into()),
        });
        let state = machine.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.user.unwrap().email, "a@x.com");
    }

    #[test]
    fn init_with_half_a_credential_is_unauthenticated() {
        let machine = AuthStateMachine::new();
        machine.dispatch(AuthAction::Init {
            user: Some(user("a@x.com")),
            token: None,
        });
        let state = machine.snapshot();
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        // The invariant also forbids a dangling user without a token.
        assert!(state.user.is_none());
    }

    #[test]
    fn second_init_is_ignored() {
        let machine = AuthStateMachine::new();
        machine.dispatch(AuthAction::Init {
            user: Some(user("a@x.com")),
            token: Some("tok".into()),
        });
        machine.dispatch(AuthAction::Init {
            user: None,
            token: None,
        });
        assert!(machine.snapshot().is_authenticated());
    }

    #[test]
    fn logout_clears_everything() {
        let machine = AuthStateMachine::new();
        machine.dispatch(AuthAction::LoginSuccess {
            user: user("a@x.com"),
            token: "tok".into(),
        });
        machine.dispatch(AuthAction::Logout);
        let state = machine.snapshot();
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        assert!(state.user.is_none() && state.token.is_none());
    }

    #[test]
    fn login_success_from_any_state() {
        let machine = AuthStateMachine::new();
        machine.dispatch(AuthAction::Logout);
        machine.dispatch(AuthAction::LoginSuccess {
            user: user("b@x.com"),
            token: "tok-2".into(),
        });
        assert!(machine.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let machine = AuthStateMachine::new();
        let mut rx = machine.subscribe();
        machine.dispatch(AuthAction::LoginSuccess {
            user: user("a@x.com"),
            token: "tok".into(),
        });
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated());
    }
}
