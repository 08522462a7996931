//! Response-body helpers shared by the credential service and the OAuth
//! exchange.

use http::StatusCode;
use serde_json::Value;

/// A response body read exactly once: the text is consumed first and JSON is
/// parsed from it best-effort. Reading twice from the underlying response is
/// impossible by construction, which is the point.
pub struct ApiBody {
    pub status: StatusCode,
    pub text: String,
    pub json: Option<Value>,
}

impl ApiBody {
    /// The server-provided human-readable failure message, when present.
    /// Login/signup endpoints use `detail`; the OAuth callback uses `message`.
    pub fn server_message(&self) -> Option<String> {
        let json = self.json.as_ref()?;
        for field in ["detail", "message"] {
            if let Some(msg) = json.get(field).and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
        None
    }
}

/// Drains the response into an `ApiBody`.
pub async fn read_body(response: reqwest::Response) -> Result<ApiBody, String> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("Error reading response body: {}", e))?;
    let json = serde_json::from_str(&text).ok();
    Ok(ApiBody { status, text, json })
}
