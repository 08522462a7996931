//! The persisted key registry.
//!
//! Every storage slot the crate may read or write is enumerated here, so that
//! initialization and logout cleanup stay exhaustive and centralized. New
//! features that persist anything must register their slot (or at least a
//! sweep namespace) in this module.

/// The bearer token issued by the login endpoint.
pub const AUTH_TOKEN: &str = "auth_token";
/// The authenticated user's profile, serialized as JSON.
pub const USER_DATA: &str = "user_data";
/// Locally generated session identifier.
pub const SESSION_ID: &str = "session_id";
/// Identifier of the user the session belongs to.
pub const ACTIVE_USER_ID: &str = "active_user_id";
/// User identifier persisted by signup (set before the first login).
pub const USER_ID: &str = "user_id";

/// Substrings that mark a key as credential-adjacent. Logout removes every
/// stored key containing one of these, in addition to the registry slots.
/// This is a heuristic cleanup; the full table is pinned by tests below.
pub const SWEEP_SUBSTRINGS: &[&str] = &["auth", "user", "token", "session", "credential"];

/// Flag slot recording whether the given provider has a linked API key.
pub fn linked_key_flag(provider: &str) -> String {
    format!("has_{}_key", provider)
}

/// Slot caching a masked preview of the provider's linked API key.
pub fn linked_key_preview(provider: &str) -> String {
    format!("{}_api_key_preview", provider)
}

/// Every slot the system may read/write for the given provider name.
pub fn registry(provider: &str) -> Vec<String> {
    vec![
        AUTH_TOKEN.to_string(),
        USER_DATA.to_string(),
        SESSION_ID.to_string(),
        ACTIVE_USER_ID.to_string(),
        USER_ID.to_string(),
        linked_key_flag(provider),
        linked_key_preview(provider),
    ]
}

/// Whether `key` must be removed by the logout sweep. Matches the base
/// denylist, the provider namespace, and any configured extra namespaces.
pub fn should_sweep(key: &str, provider: &str, extra_namespaces: &[String]) -> bool {
    SWEEP_SUBSTRINGS.iter().any(|s| key.contains(s))
        || key.contains(provider)
        || extra_namespaces.iter().any(|ns| key.contains(ns.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The sweep denylist is a regression-prone table; pin it explicitly.
    #[test]
    fn sweep_denylist_is_pinned() {
        assert_eq!(
            SWEEP_SUBSTRINGS,
            &["auth", "user", "token", "session", "credential"]
        );
    }

    #[test]
    fn registry_covers_all_slots() {
        let slots = registry("tiktok");
        assert_eq!(
            slots,
            vec![
                "auth_token",
                "user_data",
                "session_id",
                "active_user_id",
                "user_id",
                "has_tiktok_key",
                "tiktok_api_key_preview",
            ]
        );
    }

    #[test]
    fn sweep_matches_base_substrings() {
        for key in [
            "auth_token",
            "my_user_prefs",
            "refresh_token",
            "session_backup",
            "stored_credential",
        ] {
            assert!(should_sweep(key, "tiktok", &[]), "expected sweep of {key}");
        }
    }

    #[test]
    fn sweep_matches_provider_and_extra_namespaces() {
        let extras = vec!["video".to_string(), "gemini".to_string()];
        assert!(should_sweep("tiktok_open_id", "tiktok", &extras));
        assert!(should_sweep("video_draft_3", "tiktok", &extras));
        assert!(should_sweep("gemini_api_key_preview", "tiktok", &extras));
        assert!(!should_sweep("theme_preference", "tiktok", &extras));
        assert!(!should_sweep("sidebar_collapsed", "tiktok", &extras));
    }
}
