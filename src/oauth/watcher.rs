//! The opener side of the popup protocol.
//!
//! While the connect screen is mounted, the watcher consumes window messages
//! and advances as soon as the matching success message arrives. As a
//! fallback detector it also polls the popup handle every couple of seconds;
//! a closed popup only clears the handle — the user closing the window by
//! hand never counts as success by itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::window::{AuthMessage, Navigator, PopupHandle};

const POPUP_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The matching success message arrived; the UI was navigated forward.
    Completed,
    /// The message source went away (screen unmounting). No navigation.
    Disconnected,
}

pub struct PopupWatcher {
    provider: String,
    dashboard_path: String,
    navigator: Arc<dyn Navigator>,
    messages: mpsc::UnboundedReceiver<AuthMessage>,
    popup: Option<Box<dyn PopupHandle>>,
    poll_interval: Duration,
}

impl PopupWatcher {
    pub fn new(
        provider: impl Into<String>,
        dashboard_path: impl Into<String>,
        navigator: Arc<dyn Navigator>,
        messages: mpsc::UnboundedReceiver<AuthMessage>,
        popup: Option<Box<dyn PopupHandle>>,
    ) -> Self {
        PopupWatcher {
            provider: provider.into(),
            dashboard_path: dashboard_path.into(),
            navigator,
            messages,
            popup,
            poll_interval: POPUP_POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Runs until the success message arrives or the message source closes.
    /// Cancellation is by dropping/aborting this future when the hosting
    /// screen unmounts; that also stops the popup poll.
    pub async fn run(mut self) -> WatchOutcome {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                received = self.messages.recv() => match received {
                    Some(message) if message.is_auth_success(&self.provider) => {
                        info!(
                            "{} authorization reported by popup; navigating to {}",
                            self.provider, self.dashboard_path
                        );
                        self.navigator.navigate(&self.dashboard_path);
                        return WatchOutcome::Completed;
                    }
                    Some(message) => {
                        debug!("Ignoring unrelated window message: {:?}", message);
                    }
                    None => return WatchOutcome::Disconnected,
                },
                _ = ticker.tick() => self.poll_popup(),
            }
        }
    }

    fn poll_popup(&mut self) {
        if let Some(popup) = &self.popup {
            if popup.is_closed() {
                debug!("Popup was closed; clearing handle");
                self.popup = None;
            }
        }
    }
}
