// ── Runtime session configuration ──
//
// Describes *how* to talk to the inventory server: app credentials and
// connection tuning. Never touches disk; the CLI builds a `SessionConfig`
// from its config file and hands it in.

use std::time::Duration;

use stocker_api::transport::{TlsMode, TransportConfig};
use stocker_api::{DEFAULT_SAFETY_MARGIN, DEFAULT_TOKEN_ENDPOINT, SessionCredentials};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed staging servers).
    DangerAcceptInvalid,
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// App credentials exchanged for access tokens.
    pub credentials: SessionCredentials,
    /// Server method that issues tokens.
    pub token_endpoint: String,
    /// Subtracted from every token lifetime.
    pub token_safety_margin: Duration,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials: SessionCredentials::default(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.into(),
            token_safety_margin: DEFAULT_SAFETY_MARGIN,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
