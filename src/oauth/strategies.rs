//! Ordered fallback chain for reporting a completed authorization to the
//! opener.
//!
//! Cross-origin rules can make messaging or redirecting the opener fail at
//! runtime, so completion is modeled as a list of strategies tried in
//! sequence with per-strategy failure reasons, not as exception-driven
//! control flow. The last strategy (navigating the popup's own context)
//! cannot fail, so the user always reaches a terminal screen through some
//! channel.

use tracing::{debug, info, warn};

use super::window::{AuthMessage, WindowBridge};

/// One way of getting the user to a terminal screen after a successful
/// exchange.
pub trait CompletionStrategy: Send + Sync {
    fn get_name(&self) -> &str;
    fn complete(
        &self,
        bridge: &dyn WindowBridge,
        message: &AuthMessage,
        dashboard_path: &str,
    ) -> Result<(), String>;
}

/// Preferred channel: post the success message to the opener, then close.
/// The opener's watcher reacts to the message and advances the UI.
struct PostMessageStrategy;

impl CompletionStrategy for PostMessageStrategy {
    fn get_name(&self) -> &str {
        "post-message"
    }

    fn complete(
        &self,
        bridge: &dyn WindowBridge,
        message: &AuthMessage,
        _dashboard_path: &str,
    ) -> Result<(), String> {
        if !bridge.has_opener() {
            return Err("no distinct opener window".to_string());
        }
        bridge.post_message_to_opener(message)?;
        bridge.close();
        Ok(())
    }
}

/// Second channel: steer the opener straight to the dashboard, then close.
struct OpenerRedirectStrategy;

impl CompletionStrategy for OpenerRedirectStrategy {
    fn get_name(&self) -> &str {
        "opener-redirect"
    }

    fn complete(
        &self,
        bridge: &dyn WindowBridge,
        _message: &AuthMessage,
        dashboard_path: &str,
    ) -> Result<(), String> {
        if !bridge.has_opener() {
            return Err("no distinct opener window".to_string());
        }
        bridge.redirect_opener(dashboard_path)?;
        bridge.close();
        Ok(())
    }
}

/// Last resort: navigate this context itself. Also the normal path when the
/// callback ran in a full redirect rather than a popup.
struct SelfNavigateStrategy;

impl CompletionStrategy for SelfNavigateStrategy {
    fn get_name(&self) -> &str {
        "self-navigate"
    }

    fn complete(
        &self,
        bridge: &dyn WindowBridge,
        _message: &AuthMessage,
        dashboard_path: &str,
    ) -> Result<(), String> {
        bridge.navigate_self(dashboard_path);
        Ok(())
    }
}

fn completion_chain() -> Vec<Box<dyn CompletionStrategy>> {
    vec![
        Box::new(PostMessageStrategy),
        Box::new(OpenerRedirectStrategy),
        Box::new(SelfNavigateStrategy),
    ]
}

/// Tries each strategy in sequence, stopping at the first success.
pub fn complete_authorization(
    bridge: &dyn WindowBridge,
    message: &AuthMessage,
    dashboard_path: &str,
) {
    for strategy in completion_chain() {
        match strategy.complete(bridge, message, dashboard_path) {
            Ok(()) => {
                info!(
                    "Completion strategy '{}' delivered the authorization result",
                    strategy.get_name()
                );
                return;
            }
            Err(reason) => {
                warn!(
                    "Completion strategy '{}' failed: {}",
                    strategy.get_name(),
                    reason
                );
            }
        }
    }
    // SelfNavigateStrategy is infallible, so this is unreachable in practice.
    debug!("No completion strategy succeeded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every bridge call and fails the configured channels.
    #[derive(Default)]
    struct FakeBridge {
        has_opener: bool,
        fail_post_message: bool,
        fail_redirect: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBridge {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl WindowBridge for FakeBridge {
        fn has_opener(&self) -> bool {
            self.has_opener
        }

        fn post_message_to_opener(&self, message: &AuthMessage) -> Result<(), String> {
            if self.fail_post_message {
                return Err("cross-origin".to_string());
            }
            self.record(format!("post:{}", message.message_type));
            Ok(())
        }

        fn redirect_opener(&self, path: &str) -> Result<(), String> {
            if self.fail_redirect {
                return Err("cross-origin".to_string());
            }
            self.record(format!("redirect-opener:{}", path));
            Ok(())
        }

        fn navigate_self(&self, path: &str) {
            self.record(format!("navigate-self:{}", path));
        }

        fn close(&self) {
            self.record("close");
        }
    }

    fn message() -> AuthMessage {
        AuthMessage::auth_success("tiktok")
    }

    #[test]
    fn popup_with_working_messaging_posts_and_closes() {
        let bridge = FakeBridge {
            has_opener: true,
            ..Default::default()
        };
        complete_authorization(&bridge, &message(), "/dashboard");
        assert_eq!(bridge.calls(), vec!["post:tiktok_auth", "close"]);
    }

    #[test]
    fn messaging_failure_falls_back_to_opener_redirect() {
        let bridge = FakeBridge {
            has_opener: true,
            fail_post_message: true,
            ..Default::default()
        };
        complete_authorization(&bridge, &message(), "/dashboard");
        assert_eq!(
            bridge.calls(),
            vec!["redirect-opener:/dashboard", "close"]
        );
    }

    #[test]
    fn total_opener_failure_navigates_the_popup_itself() {
        let bridge = FakeBridge {
            has_opener: true,
            fail_post_message: true,
            fail_redirect: true,
            ..Default::default()
        };
        complete_authorization(&bridge, &message(), "/dashboard");
        assert_eq!(bridge.calls(), vec!["navigate-self:/dashboard"]);
    }

    #[test]
    fn no_opener_navigates_directly() {
        let bridge = FakeBridge::default();
        complete_authorization(&bridge, &message(), "/dashboard");
        assert_eq!(bridge.calls(), vec!["navigate-self:/dashboard"]);
    }
}
