use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user's profile as returned by the login endpoint.
///
/// Beyond the named fields the profile is opaque: unknown fields are carried
/// through `extra` so a persist/restore round trip loses nothing. Identity
/// comparison for session-conflict detection is by `email` only.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, username: impl Into<String>) -> Self {
        User {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            full_name: None,
            extra: Map::new(),
        }
    }
}
