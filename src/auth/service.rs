use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::linked_keys;
use crate::config::ConfigV1;
use crate::keys;
use crate::models::{AuthResponse, LoginRequest, SignupRequest, SignupResponse, User};
use crate::session::SessionManager;
use crate::state::{AuthAction, AuthStateMachine};
use crate::store::Store;
use crate::utils::http_helpers::{read_body, ApiBody};

/// Performs login/signup against the remote endpoint, resolves session
/// conflicts, persists credentials, and drives the auth state machine. This
/// is the only component that both talks to the network and writes to the
/// store.
pub struct CredentialService {
    config: Arc<ConfigV1>,
    store: Arc<dyn Store>,
    session: Arc<SessionManager>,
    machine: Arc<AuthStateMachine>,
    client: reqwest::Client,
    timeout: Duration,
    /// Set by the first 401 seen on an authenticated call; guarantees that
    /// racing 401 responses trigger exactly one logout. Reset on login.
    stale_token_seen: AtomicBool,
}

impl CredentialService {
    pub fn new(
        config: Arc<ConfigV1>,
        store: Arc<dyn Store>,
        session: Arc<SessionManager>,
        machine: Arc<AuthStateMachine>,
    ) -> Self {
        let timeout = Duration::from_millis(config.api.timeout_in_ms);
        CredentialService {
            config,
            store,
            session,
            machine,
            client: reqwest::Client::new(),
            timeout,
            stale_token_seen: AtomicBool::new(false),
        }
    }

    /// Logs in against POST /auth/login.
    ///
    /// A persisted session for a *different* email is a session conflict and
    /// is cleared before the network call; a new login always wins over a
    /// stale different-identity session. On success the token, user, and a
    /// fresh session record are persisted, the state machine transitions to
    /// Authenticated, and a fire-and-forget linked-key probe is kicked off.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        debug!("Starting login for email: {}", request.email);
        self.resolve_session_conflict(&request.email).await;

        let url = format!("{}/auth/login", self.config.api.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                debug!("Login request failed before a response arrived: {}", e);
                AuthError::Network(
                    "Network error. Please check your connection and try again.".to_string(),
                )
            })?;

        let body = read_body(response).await.map_err(AuthError::Network)?;
        if !body.status.is_success() {
            return Err(Self::map_login_failure(&body));
        }

        let auth: AuthResponse = serde_json::from_str(&body.text).map_err(|e| AuthError::Api {
            status: body.status,
            message: format!("Malformed login response: {}", e),
        })?;

        self.persist_login(&auth).await?;
        self.machine.dispatch(AuthAction::LoginSuccess {
            user: auth.user.clone(),
            token: auth.access_token.clone(),
        });
        self.stale_token_seen.store(false, Ordering::SeqCst);
        info!("Login succeeded for user '{}'", auth.user.username);

        self.spawn_linked_key_refresh(auth.access_token.clone());

        Ok(auth)
    }

    /// Signs up against POST /auth/signup, stamping `is_active`,
    /// `created_at`, and `updated_at` before sending. On success only the
    /// returned id is persisted; signup does not log the user in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, AuthError> {
        debug!("Starting signup for email: {}", request.email);

        let mut payload = serde_json::to_value(request).map_err(|e| AuthError::Api {
            status: StatusCode::BAD_REQUEST,
            message: format!("Malformed signup request: {}", e),
        })?;
        if let Value::Object(fields) = &mut payload {
            let now = Utc::now().to_rfc3339();
            fields.insert("is_active".to_string(), Value::Bool(true));
            fields.insert("created_at".to_string(), Value::String(now.clone()));
            fields.insert("updated_at".to_string(), Value::String(now));
        }

        let url = format!("{}/auth/signup", self.config.api.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                debug!("Signup request failed before a response arrived: {}", e);
                AuthError::Network("Signup failed due to network error".to_string())
            })?;

        let body = read_body(response).await.map_err(AuthError::Network)?;
        if !body.status.is_success() {
            let message = body
                .server_message()
                .unwrap_or_else(|| format!("Signup failed: {}", body.status.as_u16()));
            return Err(AuthError::Api {
                status: body.status,
                message,
            });
        }

        let signup: SignupResponse = serde_json::from_str(&body.text).map_err(|e| AuthError::Api {
            status: body.status,
            message: format!("Malformed signup response: {}", e),
        })?;

        if let Err(e) = self.store.set(keys::USER_ID, &signup.id).await {
            warn!("Failed to persist signup user id: {}", e);
        }
        info!("Signup succeeded, user id '{}' persisted", signup.id);

        Ok(signup)
    }

    /// Clears every persisted credential slot plus anything matching the
    /// sweep denylist, transitions to Unauthenticated, and returns the path
    /// the caller should navigate to. Performs no network I/O; navigation is
    /// the caller's responsibility, which keeps this core
    /// navigation-library-agnostic.
    pub async fn logout(&self, redirect_path: Option<&str>) -> String {
        info!("Starting logout, clearing persisted credentials");

        let provider = &self.config.provider.name;
        for slot in keys::registry(provider) {
            self.remove_quietly(&slot).await;
        }

        // Sweep ad-hoc keys that features may have added outside the registry.
        match self.store.keys().await {
            Ok(all_keys) => {
                for key in all_keys {
                    if keys::should_sweep(&key, provider, &self.config.storage.extra_sweep) {
                        self.remove_quietly(&key).await;
                    }
                }
            }
            Err(e) => warn!("Logout sweep could not list keys: {}", e),
        }

        self.machine.dispatch(AuthAction::Logout);
        debug!("Cleared all session and auth data");

        redirect_path
            .unwrap_or(&self.config.provider.login_path)
            .to_string()
    }

    /// Headers for an authenticated request: bearer token plus JSON
    /// content-type when a token is persisted, content-type only otherwise.
    pub async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Ok(Some(token)) = self.store.get(keys::AUTH_TOKEN).await {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Persisted token is not a valid header value: {}", e),
            }
        }

        headers
    }

    /// Issues a request with auth headers merged in (caller headers win on
    /// conflict). A 401 response is the system's single enforcement point
    /// for "stale token detected": it triggers exactly one logout side
    /// effect, however many such calls race, before surfacing the error.
    pub async fn fetch_with_auth(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, AuthError> {
        let mut headers = self.auth_headers().await;
        if let Some(extra) = extra_headers {
            for (name, value) in extra.iter() {
                headers.insert(name, value.clone());
            }
        }

        let mut builder = self
            .client
            .request(method, url)
            .timeout(self.timeout)
            .headers(headers);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| {
            debug!("Authenticated request failed before a response arrived: {}", e);
            AuthError::Network(
                "Network error. Please check your connection and try again.".to_string(),
            )
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if !self.stale_token_seen.swap(true, Ordering::SeqCst) {
                warn!("Received 401 on authenticated call; dropping stale session");
                self.logout(None).await;
            }
            return Err(AuthError::Unauthorized);
        }

        Ok(response)
    }

    /// If a different identity's session is persisted, remove it so the new
    /// login starts clean. Same-email logins leave everything in place.
    async fn resolve_session_conflict(&self, new_email: &str) {
        let existing_token = self.store.get(keys::AUTH_TOKEN).await.unwrap_or(None);
        let existing_user = self.store.get(keys::USER_DATA).await.unwrap_or(None);

        let (Some(_), Some(raw_user)) = (existing_token, existing_user) else {
            return;
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(existing) if existing.email != new_email => {
                warn!(
                    "Session conflict: persisted user '{}' differs from new login '{}'; \
                     forcing logout of existing session",
                    existing.email, new_email
                );
                self.session.remove_session_id().await.ok();
                self.session.remove_active_user_id().await.ok();
                self.remove_quietly(keys::AUTH_TOKEN).await;
                self.remove_quietly(keys::USER_DATA).await;
                self.remove_quietly(keys::USER_ID).await;
            }
            Ok(_) => {}
            Err(e) => error!("Error checking existing session: {}", e),
        }
    }

    async fn persist_login(&self, auth: &AuthResponse) -> Result<(), AuthError> {
        self.store
            .set(keys::AUTH_TOKEN, &auth.access_token)
            .await
            .map_err(AuthError::Storage)?;

        let user_json = serde_json::to_string(&auth.user).map_err(|e| {
            AuthError::Storage(format!("Failed to serialize user profile: {}", e))
        })?;
        self.store
            .set(keys::USER_DATA, &user_json)
            .await
            .map_err(AuthError::Storage)?;

        let session_id = self.session.generate_session_id();
        debug!("Generated new session id: {}", session_id);
        self.session
            .set_session_id(&session_id)
            .await
            .map_err(AuthError::Storage)?;
        self.session
            .set_active_user_id(&auth.user.id)
            .await
            .map_err(AuthError::Storage)?;

        Ok(())
    }

    /// Kicks off the linked-key probe without awaiting it. The task may
    /// outlive this login call; its outcome never affects the caller.
    fn spawn_linked_key_refresh(&self, token: String) {
        let store = self.store.clone();
        let base_url = self.config.api.base_url.clone();
        let provider = self.config.provider.name.clone();
        tokio::spawn(async move {
            linked_keys::refresh_linked_key_flags(store, &base_url, &provider, &token).await;
        });
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!("Failed to remove '{}': {}", key, e);
        }
    }

    fn map_login_failure(body: &ApiBody) -> AuthError {
        match body.status {
            StatusCode::UNAUTHORIZED => AuthError::InvalidCredentials,
            StatusCode::TOO_MANY_REQUESTS => AuthError::RateLimited,
            StatusCode::INTERNAL_SERVER_ERROR => AuthError::ServerError,
            status => AuthError::Api {
                status,
                message: body
                    .server_message()
                    .unwrap_or_else(|| "Login failed. Please try again.".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(status: StatusCode, text: &str) -> ApiBody {
        ApiBody {
            status,
            text: text.to_string(),
            json: serde_json::from_str(text).ok(),
        }
    }

    #[test]
    fn login_failures_map_to_the_documented_taxonomy() {
        assert_eq!(
            CredentialService::map_login_failure(&body(StatusCode::UNAUTHORIZED, "{}")),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            CredentialService::map_login_failure(&body(StatusCode::TOO_MANY_REQUESTS, "{}")),
            AuthError::RateLimited
        );
        assert_eq!(
            CredentialService::map_login_failure(&body(StatusCode::INTERNAL_SERVER_ERROR, "{}")),
            AuthError::ServerError
        );
    }

    #[test]
    fn other_failures_surface_the_server_detail() {
        let err = CredentialService::map_login_failure(&body(
            StatusCode::FORBIDDEN,
            r#"{"detail": "Account disabled"}"#,
        ));
        assert_eq!(
            err,
            AuthError::Api {
                status: StatusCode::FORBIDDEN,
                message: "Account disabled".into()
            }
        );

        let err = CredentialService::map_login_failure(&body(StatusCode::BAD_GATEWAY, "oops"));
        assert_eq!(err.to_string(), "Login failed. Please try again.");
    }
}
