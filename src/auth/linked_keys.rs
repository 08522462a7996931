//! Best-effort post-login enrichment: probe whether the account has a linked
//! provider API key and cache the answer in the store. This runs
//! fire-and-forget after login; nothing here may ever affect the login
//! outcome, so every failure path is swallowed.

use std::sync::Arc;

use cached::proc_macro::cached;
use tracing::debug;

use crate::keys;
use crate::models::LinkedKeyStatus;
use crate::store::Store;

/// Queries GET /<provider>-keys/ with bearer auth. The endpoint returns the
/// key status, or a JSON `null` when no key is linked.
#[cfg_attr(
    not(test),
    cached(time = 60, result = true, sync_writes = "default")
)]
async fn query(
    base_url: String,
    provider: String,
    token: String,
) -> Result<Option<LinkedKeyStatus>, String> {
    let client = reqwest::Client::new();
    let url = format!("{}/{}-keys/", base_url, provider);

    debug!("Probing linked {} key at: {}", provider, url);
    let response = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .map_err(|e| format!("Error sending request: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Unexpected status code: {}", response.status()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| format!("Error reading response body: {}", e))?;

    // A null or malformed body both mean "no linked key".
    Ok(serde_json::from_str::<Option<LinkedKeyStatus>>(&body).unwrap_or(None))
}

/// Probes the linked-key endpoint and updates the cached flag slots. The
/// result only ever affects UI hints, never auth state.
pub async fn refresh_linked_key_flags(
    store: Arc<dyn Store>,
    base_url: &str,
    provider: &str,
    token: &str,
) {
    let flag_slot = keys::linked_key_flag(provider);
    let preview_slot = keys::linked_key_preview(provider);

    match query(
        base_url.to_string(),
        provider.to_string(),
        token.to_string(),
    )
    .await
    {
        Ok(Some(status)) => {
            if let Some(preview) = &status.api_key_preview {
                if let Err(e) = store.set(&preview_slot, preview).await {
                    debug!("Failed to cache key preview (ignored): {}", e);
                }
            }
            if let Err(e) = store.set(&flag_slot, &status.has_key().to_string()).await {
                debug!("Failed to cache key flag (ignored): {}", e);
            }
            debug!("Cached {} key presence from server", provider);
        }
        Ok(None) => {
            // Explicitly record absence when the endpoint says there is no key.
            if let Err(e) = store.set(&flag_slot, "false").await {
                debug!("Failed to cache key flag (ignored): {}", e);
            }
            if let Err(e) = store.remove(&preview_slot).await {
                debug!("Failed to clear key preview (ignored): {}", e);
            }
            debug!("No linked {} key found", provider);
        }
        Err(e) => {
            debug!("Linked {} key probe failed (ignored): {}", provider, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_store::MemoryStore;
    use mockito::Server;

    #[tokio::test]
    async fn present_key_sets_flag_and_preview() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/tiktok-keys/")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"api_key_preview": "sk-...abcd", "is_active": true}"#)
            .create_async()
            .await;

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        refresh_linked_key_flags(store.clone(), &server.url(), "tiktok", "tok").await;
        m.assert_async().await;

        assert_eq!(
            store.get("has_tiktok_key").await.unwrap(),
            Some("true".into())
        );
        assert_eq!(
            store.get("tiktok_api_key_preview").await.unwrap(),
            Some("sk-...abcd".into())
        );
    }

    #[tokio::test]
    async fn null_body_records_absence() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tiktok-keys/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("null")
            .create_async()
            .await;

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .set("tiktok_api_key_preview", "stale")
            .await
            .unwrap();

        refresh_linked_key_flags(store.clone(), &server.url(), "tiktok", "tok").await;

        assert_eq!(
            store.get("has_tiktok_key").await.unwrap(),
            Some("false".into())
        );
        assert_eq!(store.get("tiktok_api_key_preview").await.unwrap(), None);
    }

    #[tokio::test]
    async fn probe_failure_touches_nothing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tiktok-keys/")
            .with_status(500)
            .create_async()
            .await;

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        refresh_linked_key_flags(store.clone(), &server.url(), "tiktok", "tok").await;

        assert_eq!(store.get("has_tiktok_key").await.unwrap(), None);
        assert_eq!(store.get("tiktok_api_key_preview").await.unwrap(), None);
    }
}
