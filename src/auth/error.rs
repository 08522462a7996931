use http::StatusCode;

/// The single typed failure surfaced by the credential service. Every remote
/// failure is converted into one of these at the service boundary; the
/// `Display` text is the human-readable message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// 401 from the login endpoint: the credentials were wrong.
    InvalidCredentials,
    /// 429: the caller should back off and retry manually.
    RateLimited,
    /// 500: the server broke; retry later.
    ServerError,
    /// 401 from any authenticated call. The stale session has already been
    /// dropped by the time this is surfaced.
    Unauthorized,
    /// Any other HTTP failure, carrying the server-provided detail message
    /// when one was present.
    Api { status: StatusCode, message: String },
    /// No HTTP response at all (DNS, connect, timeout). The message is
    /// flow-specific but always generic about the cause.
    Network(String),
    /// The local credential store failed.
    Storage(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password."),
            AuthError::RateLimited => {
                write!(f, "Too many attempts. Please wait and try again.")
            }
            AuthError::ServerError => {
                write!(f, "Server error during login. Please try again later.")
            }
            AuthError::Unauthorized => write!(f, "Unauthorized access"),
            AuthError::Api { message, .. } => write!(f, "{}", message),
            AuthError::Network(message) => write!(f, "{}", message),
            AuthError::Storage(message) => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_user_facing_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password."
        );
        assert_eq!(
            AuthError::Api {
                status: StatusCode::CONFLICT,
                message: "Email already registered".into()
            }
            .to_string(),
            "Email already registered"
        );
    }
}
