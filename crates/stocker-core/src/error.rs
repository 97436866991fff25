// ── Core error types ──
//
// User-facing errors from stocker-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<stocker_api::Error>`
// impls translate transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Login ────────────────────────────────────────────────────────
    #[error("Invalid QR code: {reason}")]
    InvalidQrCode { reason: String },

    #[error("Not logged in -- scan a company QR code first")]
    NotLoggedIn,

    #[error("No warehouse selected")]
    NoWarehouseSelected,

    #[error("No shelf selected")]
    NoShelfSelected,

    // ── Connection / auth ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out: {reason}")]
    Timeout { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operations ───────────────────────────────────────────────────
    #[error("Rejected by server: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<&stocker_api::Error> for CoreError {
    fn from(err: &stocker_api::Error) -> Self {
        use stocker_api::Error as ApiError;

        match err {
            ApiError::MissingBaseUrl => CoreError::NotLoggedIn,
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::InvalidInput(message) => CoreError::ValidationFailed {
                message: message.clone(),
            },
            ApiError::Transport(e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout {
                        reason: e.to_string(),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::Unauthorized { message } => CoreError::AuthenticationFailed {
                message: message.clone(),
            },
            ApiError::TokenUnavailable => CoreError::AuthenticationFailed {
                message: "no access token could be obtained -- check the API credentials".into(),
            },
            ApiError::Api {
                status: 404,
                message,
            } => CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: message.clone(),
            },
            ApiError::Api { status, message } => CoreError::Api {
                message: message.clone(),
                status: Some(*status),
            },
            ApiError::Application { message } => CoreError::Rejected {
                message: message.clone(),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<stocker_api::Error> for CoreError {
    fn from(err: stocker_api::Error) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_base_url_means_not_logged_in() {
        let err = CoreError::from(stocker_api::Error::MissingBaseUrl);
        assert!(matches!(err, CoreError::NotLoggedIn));
    }

    #[test]
    fn not_found_and_application_errors() {
        let err = CoreError::from(stocker_api::Error::Api {
            status: 404,
            message: "no such item".into(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err = CoreError::from(stocker_api::Error::Application {
            message: "Entry is locked".into(),
        });
        assert_eq!(err.to_string(), "Rejected by server: Entry is locked");
    }

    #[test]
    fn auth_errors() {
        let err = CoreError::from(&stocker_api::Error::TokenUnavailable);
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
