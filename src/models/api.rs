use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::user::User;

/// Body for POST /auth/login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for POST /auth/signup, before the service stamps the bookkeeping
/// fields (`is_active`, `created_at`, `updated_at`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful response from POST /auth/login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful response from POST /auth/signup. Only `id` is persisted;
/// signup does not log the user in.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupResponse {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response from POST /<provider>/callback.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CallbackResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response from GET /<provider>-keys/. Both fields are nullable; presence
/// of either marks the account as having a linked key.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LinkedKeyStatus {
    #[serde(default)]
    pub api_key_preview: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl LinkedKeyStatus {
    pub fn has_key(&self) -> bool {
        self.api_key_preview.is_some() || self.is_active.unwrap_or(false)
    }
}
