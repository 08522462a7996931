pub mod exchange;
pub mod strategies;
pub mod watcher;
pub mod window;

pub use exchange::{CallbackOutcome, CallbackParams, CallbackStatus, PopupController};
pub use watcher::{PopupWatcher, WatchOutcome};
pub use window::{AuthMessage, Navigator, PopupHandle, WindowBridge};
