use std::sync::Arc;

use tracing::info;

use authkeeper::config::{load_config, print_schema};
use authkeeper::startup;
use authkeeper::state::AuthStatus;
use authkeeper::utils::logger::init_logging;

/// Loads the config, restores any persisted session, and reports its status.
/// `--schema` prints the configuration JSON schema instead.
#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging);

    let ctx = startup::build_context(config);
    startup::initialize(&ctx).await;

    let state = ctx.machine.snapshot();
    match state.status {
        AuthStatus::Authenticated => {
            let username = state
                .user
                .as_ref()
                .map(|u| u.username.as_str())
                .unwrap_or("unknown");
            info!("Session restored: authenticated as '{}'", username);
        }
        status => info!("No active session (status: {:?})", status),
    }
}
