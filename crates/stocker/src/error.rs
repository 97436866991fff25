//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use stocker_config::ConfigError;
use stocker_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(stocker::connection_failed),
        help(
            "Check that the server is reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try: stocker --insecure token"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out: {reason}")]
    #[diagnostic(
        code(stocker::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(
        code(stocker::not_logged_in),
        help("Log in with the company QR payload: stocker login <payload>")
    )]
    NotLoggedIn,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(stocker::auth_failed),
        help(
            "Verify the app credentials.\n\
             Run: stocker config set-credential api_key (and api_secret, app_key)\n\
             Or set STOCKER_API_KEY, STOCKER_API_SECRET and STOCKER_APP_KEY."
        )
    )]
    AuthFailed { message: String },

    #[error("Invalid QR code: {reason}")]
    #[diagnostic(
        code(stocker::invalid_qr),
        help("Pass the base64 text exactly as scanned from the company QR code.")
    )]
    InvalidQrCode { reason: String },

    // ── Selection ────────────────────────────────────────────────────
    #[error("No warehouse selected")]
    #[diagnostic(
        code(stocker::no_warehouse),
        help("Select one with: stocker use <warehouse>, or pass --warehouse")
    )]
    NoWarehouse,

    #[error("No shelf selected")]
    #[diagnostic(
        code(stocker::no_shelf),
        help("Select one with: stocker use <warehouse> --shelf <shelf>, or pass --shelf")
    )]
    NoShelf,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(stocker::not_found),
        help("Run: stocker {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server rejected the request: {message}")]
    #[diagnostic(code(stocker::rejected))]
    Rejected { message: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(stocker::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stocker::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(stocker::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(stocker::config),
        help("Inspect the file with: stocker config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(stocker::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(stocker::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => exit_code::CONNECTION,
            Self::NotLoggedIn | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidQrCode { .. }
            | Self::NoWarehouse
            | Self::NoShelf
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidQrCode { reason } => CliError::InvalidQrCode { reason },
            CoreError::NotLoggedIn => CliError::NotLoggedIn,
            CoreError::NoWarehouseSelected => CliError::NoWarehouse,
            CoreError::NoShelfSelected => CliError::NoShelf,

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout { reason } => CliError::Timeout { reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => {
                let list_command = match entity_type.as_str() {
                    "Item" => "items list",
                    "Warehouse" => "warehouses list",
                    "Entry" => "entries list",
                    _ => "--help",
                };
                CliError::NotFound {
                    resource_type: entity_type,
                    identifier,
                    list_command: list_command.into(),
                }
            }

            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "transport".into(), |s| s.to_string()),
                message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<stocker_api::Error> for CliError {
    fn from(err: stocker_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
