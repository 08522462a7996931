//! Capabilities the embedding must supply for the popup protocol.
//!
//! The core never touches a real window; it drives these traits. A webview
//! shell implements them over its window objects, tests use recording fakes.

use serde::{Deserialize, Serialize};

/// The message a popup posts to its opener when authorization completes.
/// Wire shape: `{"type": "<provider>_auth", "success": true}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub success: bool,
}

impl AuthMessage {
    pub fn auth_success(provider: &str) -> Self {
        AuthMessage {
            message_type: format!("{}_auth", provider),
            success: true,
        }
    }

    /// Whether this is the success message the connect screen waits for.
    pub fn is_auth_success(&self, provider: &str) -> bool {
        self.message_type == format!("{}_auth", provider) && self.success
    }
}

/// Navigate-to-path capability. Navigation mechanics (router, webview, ...)
/// stay outside this core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// The popup's view of its own browsing context and its opener.
///
/// `post_message_to_opener` and `redirect_opener` are fallible: cross-origin
/// rules or a blocked popup can make either fail at runtime, which is why
/// completion runs through an ordered strategy chain. Navigating or closing
/// one's own context always works.
pub trait WindowBridge: Send + Sync {
    /// True when this context has an opener distinct from itself.
    fn has_opener(&self) -> bool;
    fn post_message_to_opener(&self, message: &AuthMessage) -> Result<(), String>;
    fn redirect_opener(&self, path: &str) -> Result<(), String>;
    fn navigate_self(&self, path: &str);
    fn close(&self);
}

/// Closable handle returned by the opener's popup-window primitive.
pub trait PopupHandle: Send + Sync {
    fn is_closed(&self) -> bool;
}
