pub mod error;
pub mod linked_keys;
pub mod service;

// Re-export so callers can "use crate::auth::{AuthError, CredentialService};"
pub use error::AuthError;
pub use service::CredentialService;
