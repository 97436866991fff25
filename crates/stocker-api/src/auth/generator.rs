// Access token acquisition.
//
// Exchanges the static app credentials for a bearer token at the
// server's token endpoint. Expected failures (missing credentials, no base
// URL yet, rejected credentials, malformed response) yield `Ok(None)` so
// callers treat them as "unauthenticated" rather than as exceptions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::store::{AccessToken, BaseUrl};
use crate::client::method_path;
use crate::error::Error;

/// Server method that issues access tokens.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "gpos.gpos.pos.generate_token_secure";

/// Subtracted from the server-reported lifetime so a token is replaced
/// slightly before the server stops accepting it.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(30);

// Ten years; anything longer is treated as this.
const MAX_LIFETIME_SECS: f64 = 315_360_000.0;

// ── Credentials ──────────────────────────────────────────────────────

/// Static app credentials exchanged for an access token.
///
/// Any missing or blank field disables token acquisition.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub api_key: Option<SecretString>,
    pub api_secret: Option<SecretString>,
    pub app_key: Option<SecretString>,
}

impl SessionCredentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            api_secret: Some(SecretString::from(api_secret.into())),
            app_key: Some(SecretString::from(app_key.into())),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.form_fields().is_some()
    }

    /// Names of the fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("api_key", self.api_key.as_ref()),
            ("api_secret", self.api_secret.as_ref()),
            ("app_key", self.app_key.as_ref()),
        ]
        .into_iter()
        .filter(|(_, v)| present(*v).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    fn form_fields(&self) -> Option<[(&'static str, &str); 3]> {
        Some([
            ("api_key", present(self.api_key.as_ref())?),
            ("api_secret", present(self.api_secret.as_ref())?),
            ("app_key", present(self.app_key.as_ref())?),
        ])
    }
}

fn present(secret: Option<&SecretString>) -> Option<&str> {
    secret
        .map(|s| s.expose_secret())
        .filter(|s| !s.trim().is_empty())
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    expires_in: Option<f64>,
}

// ── TokenGenerator ───────────────────────────────────────────────────

/// Requests fresh access tokens from the server.
///
/// Uses the bare HTTP client: token requests never carry a bearer header
/// and never go through the 401 refresh path.
#[derive(Debug)]
pub struct TokenGenerator {
    http: reqwest::Client,
    base_url: Arc<BaseUrl>,
    credentials: SessionCredentials,
    endpoint: String,
    safety_margin: Duration,
}

impl TokenGenerator {
    pub fn new(
        http: reqwest::Client,
        base_url: Arc<BaseUrl>,
        credentials: SessionCredentials,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            endpoint: DEFAULT_TOKEN_ENDPOINT.into(),
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    /// Override the server method name (without the `/api/method/` prefix).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Request path of the token endpoint, e.g. `/api/method/<endpoint>`.
    pub fn endpoint_path(&self) -> String {
        method_path(&self.endpoint)
    }

    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Request a new access token.
    ///
    /// `Ok(None)` means no token could be obtained for an expected reason;
    /// only transport failures are returned as errors.
    pub async fn generate(&self) -> Result<Option<AccessToken>, Error> {
        let Some(fields) = self.credentials.form_fields() else {
            warn!(
                missing = ?self.credentials.missing_fields(),
                "missing API credentials -- token acquisition disabled"
            );
            return Ok(None);
        };

        let url = match self.base_url.join(&self.endpoint_path()) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot request access token");
                return Ok(None);
            }
        };

        debug!("POST {}", url);

        let resp = self.http.post(url).form(&fields[..]).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected the request");
            return Ok(None);
        }

        let parsed: TokenResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "token response was not valid JSON");
                return Ok(None);
            }
        };

        let Some(data) = parsed.data else {
            warn!("token response has no data object");
            return Ok(None);
        };

        let Some(value) = data.access_token.filter(|t| !t.is_empty()) else {
            warn!("no access_token in token response");
            return Ok(None);
        };

        let token = AccessToken::new(value, self.expiry(data.expires_in.unwrap_or(0.0)));
        info!(
            token = %token.masked(),
            expires_at = %token.expires_at(),
            "access token issued"
        );
        Ok(Some(token))
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn expiry(&self, expires_in: f64) -> chrono::DateTime<Utc> {
        let now = Utc::now();
        let lifetime = TimeDelta::seconds(expires_in.clamp(0.0, MAX_LIFETIME_SECS) as i64);
        let margin = TimeDelta::from_std(self.safety_margin).unwrap_or(TimeDelta::zero());
        (now + lifetime - margin).max(now)
    }
}
