use thiserror::Error;

/// Top-level error type for the `stocker-api` crate.
///
/// Covers every failure mode of the HTTP layer: configuration, transport,
/// authentication, server-side rejections, and payload decoding.
/// `stocker-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// No base URL has been set yet (login has not happened).
    #[error("No API base URL configured -- log in first")]
    MissingBaseUrl,

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Caller supplied an argument the server would reject anyway.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ── Authentication ──────────────────────────────────────────────
    /// The server answered 401 and a token refresh could not recover it.
    #[error("Unauthorized (HTTP 401): {message}")]
    Unauthorized { message: String },

    /// No access token could be obtained (missing credentials, rejected
    /// credentials, or a malformed token response).
    #[error("Access token unavailable")]
    TokenUnavailable,

    // ── Server ──────────────────────────────────────────────────────
    /// Non-2xx response from an API endpoint.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 200 carrying an error envelope (`{"data": {"status": "error"}}`).
    #[error("Request rejected by server: {message}")]
    Application { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and logging in again might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::TokenUnavailable)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_counts_as_expired_auth() {
        let err = Error::Unauthorized {
            message: "token expired".into(),
        };
        assert!(err.is_auth_expired());
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_transient());
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "maintenance".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn api_404_is_not_found() {
        let err = Error::Api {
            status: 404,
            message: "missing".into(),
        };
        assert!(err.is_not_found());
    }
}
