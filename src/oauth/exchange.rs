//! The callback side of the popup protocol: parse the redirect URL, exchange
//! the authorization code, and report the outcome through the completion
//! chain. Each attempt is a small state machine, Loading → Success | Error,
//! both terminal.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::strategies::complete_authorization;
use super::window::{AuthMessage, WindowBridge};
use crate::config::ConfigV1;
use crate::keys;
use crate::models::CallbackResponse;
use crate::store::Store;
use crate::utils::http_helpers::read_body;

/// The query parameters an authorization server appends to the redirect URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    pub fn from_url(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw).map_err(|e| format!("Invalid callback URL: {}", e))?;
        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(params)
    }
}

/// Terminal status of one callback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Loading,
    Success,
    Error,
}

/// What the callback screen renders: a terminal status plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub message: String,
}

impl CallbackOutcome {
    fn success(message: impl Into<String>) -> Self {
        CallbackOutcome {
            status: CallbackStatus::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        CallbackOutcome {
            status: CallbackStatus::Error,
            message: message.into(),
        }
    }
}

/// Runs inside the popup (or redirect target) and completes the
/// authorization-code exchange. Assumes the child context shares storage
/// with the opener, i.e. same origin.
pub struct PopupController {
    config: Arc<ConfigV1>,
    store: Arc<dyn Store>,
    client: reqwest::Client,
    timeout: Duration,
}

impl PopupController {
    pub fn new(config: Arc<ConfigV1>, store: Arc<dyn Store>) -> Self {
        let timeout = Duration::from_millis(config.api.timeout_in_ms);
        PopupController {
            config,
            store,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Handles a callback URL end to end: exchange, then — only on success —
    /// report through the fallback chain. Error outcomes stay in this
    /// context so the embedding can render them.
    pub async fn handle_callback(&self, url: &str, bridge: &dyn WindowBridge) -> CallbackOutcome {
        let outcome = self.run_exchange(url).await;

        match outcome.status {
            CallbackStatus::Success => {
                let message = AuthMessage::auth_success(&self.config.provider.name);
                complete_authorization(bridge, &message, &self.config.provider.dashboard_path);
            }
            CallbackStatus::Error => {
                warn!("Authorization callback failed: {}", outcome.message);
            }
            CallbackStatus::Loading => {}
        }

        outcome
    }

    /// The exchange itself. Validation failures (missing code, missing
    /// token) short-circuit before any network call.
    pub async fn run_exchange(&self, url: &str) -> CallbackOutcome {
        let provider = &self.config.provider.name;

        let params = match CallbackParams::from_url(url) {
            Ok(params) => params,
            Err(e) => return CallbackOutcome::error(e),
        };

        if let Some(error) = params.error {
            return CallbackOutcome::error(format!("Authorization error: {}", error));
        }

        let Some(code) = params.code else {
            return CallbackOutcome::error("Missing authorization code.");
        };

        let token = match self.store.get(keys::AUTH_TOKEN).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return CallbackOutcome::error(format!(
                    "You must be logged in to complete {} authentication.",
                    provider
                ));
            }
            Err(e) => return CallbackOutcome::error(format!("Storage error: {}", e)),
        };

        let endpoint = format!("{}/{}/callback", self.config.api.base_url, provider);
        debug!("Exchanging authorization code at: {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .timeout(self.timeout)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "code": code, "state": params.state }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!("Exchange request failed before a response arrived: {}", e);
                return CallbackOutcome::error(format!("{} authentication failed.", provider));
            }
        };

        // Read the body exactly once: text first, then best-effort JSON.
        let body = match read_body(response).await {
            Ok(body) => body,
            Err(e) => return CallbackOutcome::error(e),
        };

        if !body.status.is_success() {
            let message = body.server_message().unwrap_or_else(|| {
                format!("{} authentication failed ({}).", provider, body.status.as_u16())
            });
            return CallbackOutcome::error(message);
        }

        let parsed: Option<CallbackResponse> = serde_json::from_str(&body.text).ok();
        info!("{} authorization exchange succeeded", provider);
        CallbackOutcome::success(
            parsed
                .and_then(|r| r.message)
                .unwrap_or_else(|| format!("{} authentication successful", provider)),
        )
    }
}
