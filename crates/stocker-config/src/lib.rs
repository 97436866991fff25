//! Configuration for the stocker CLI.
//!
//! TOML config file, credential resolution (env + keyring + plaintext),
//! persisted login/selection state, and translation to
//! `stocker_core::SessionConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use stocker_core::{LoginProfile, SessionConfig, SessionCredentials, TlsVerification, Warehouse};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "stocker";

/// Credential fields, in the order they are sent to the token endpoint.
pub const CREDENTIAL_FIELDS: [&str; 3] = ["api_key", "api_secret", "app_key"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown credential field '{0}' (expected api_key, api_secret or app_key)")]
    UnknownCredential(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Server method that issues access tokens.
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Seconds subtracted from every token lifetime.
    #[serde(default = "default_safety_margin")]
    pub token_safety_margin: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Plaintext credentials (prefer env or keyring).
    #[serde(default)]
    pub credentials: Credentials,

    /// Written by `stocker login`, removed by `stocker logout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginState>,

    /// Written by `stocker use`.
    #[serde(default)]
    pub selection: Selection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_endpoint: default_token_endpoint(),
            token_safety_margin: default_safety_margin(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            credentials: Credentials::default(),
            login: None,
            selection: Selection::default(),
        }
    }
}

fn default_token_endpoint() -> String {
    stocker_api::DEFAULT_TOKEN_ENDPOINT.into()
}
fn default_safety_margin() -> u64 {
    stocker_api::DEFAULT_SAFETY_MARGIN.as_secs()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
}

impl Credentials {
    fn field(&self, name: &str) -> Option<&String> {
        match name {
            "api_key" => self.api_key.as_ref(),
            "api_secret" => self.api_secret.as_ref(),
            "app_key" => self.app_key.as_ref(),
            _ => None,
        }
    }
}

/// Persisted QR login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoginState {
    pub company: String,
    pub employee_code: String,
    pub user_id: String,
    pub full_name: String,
    pub api: String,
    pub base_url: String,
}

impl LoginState {
    pub fn from_profile(profile: &LoginProfile) -> Self {
        Self {
            company: profile.company.clone(),
            employee_code: profile.employee_code.clone(),
            user_id: profile.user_id.clone(),
            full_name: profile.full_name.clone(),
            api: profile.api.clone(),
            base_url: profile.base_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    pub fn to_profile(&self) -> Result<LoginProfile, ConfigError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ConfigError::Validation {
            field: "login.base_url".into(),
            reason: format!("invalid URL '{}': {e}", self.base_url),
        })?;
        Ok(LoginProfile {
            company: self.company.clone(),
            employee_code: self.employee_code.clone(),
            user_id: self.user_id.clone(),
            full_name: self.full_name.clone(),
            api: self.api.clone(),
            base_url,
        })
    }
}

/// Persisted warehouse and shelf selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,
}

impl Selection {
    pub fn warehouse(&self) -> Option<Warehouse> {
        let id = self.warehouse_id.as_ref().filter(|id| !id.is_empty())?;
        Some(Warehouse {
            warehouse_id: id.clone(),
            warehouse_name: self.warehouse_name.clone().unwrap_or_default(),
        })
    }

    pub fn set_warehouse(&mut self, warehouse: Option<&Warehouse>) {
        self.warehouse_id = warehouse.map(|w| w.warehouse_id.clone());
        self.warehouse_name = warehouse
            .map(|w| w.warehouse_name.clone())
            .filter(|n| !n.is_empty());
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `STOCKER_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("STOCKER_CONFIG").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "stocker", "stocker").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stocker");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
///
/// Nested keys use a double underscore: `STOCKER_LOGIN__BASE_URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("STOCKER_")
                .ignore(&["api_key", "api_secret", "app_key", "config"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Environment variable consulted for a credential field.
pub fn credential_env_var(field: &str) -> String {
    format!("STOCKER_{}", field.to_ascii_uppercase())
}

/// Keyring account name for a credential field.
pub fn credential_keyring_key(field: &str) -> String {
    format!("credentials/{field}")
}

fn check_field(field: &str) -> Result<(), ConfigError> {
    if CREDENTIAL_FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(ConfigError::UnknownCredential(field.into()))
    }
}

/// Resolve the app credentials: env var, then system keyring, then
/// plaintext in the config file. Missing fields stay `None`, which
/// disables token acquisition rather than failing.
pub fn resolve_credentials(cfg: &Config) -> SessionCredentials {
    resolve_credentials_with(
        cfg,
        |field| std::env::var(credential_env_var(field)).ok(),
        |field| {
            keyring::Entry::new(KEYRING_SERVICE, &credential_keyring_key(field))
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// [`resolve_credentials`] with explicit env and keyring lookups.
pub fn resolve_credentials_with(
    cfg: &Config,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> SessionCredentials {
    let resolve = |field: &str| -> Option<SecretString> {
        let non_blank = |v: &String| !v.trim().is_empty();
        env(field)
            .filter(non_blank)
            .or_else(|| keyring(field).filter(non_blank))
            .or_else(|| cfg.credentials.field(field).filter(|v| !v.trim().is_empty()).cloned())
            .map(SecretString::from)
    };

    SessionCredentials {
        api_key: resolve("api_key"),
        api_secret: resolve("api_secret"),
        app_key: resolve("app_key"),
    }
}

/// Store a credential in the system keyring.
pub fn store_credential(field: &str, value: &str) -> Result<(), ConfigError> {
    check_field(field)?;
    let entry = keyring::Entry::new(KEYRING_SERVICE, &credential_keyring_key(field))?;
    entry.set_password(value)?;
    Ok(())
}

/// Store a credential as plaintext in the config.
pub fn set_plaintext_credential(
    cfg: &mut Config,
    field: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_field(field)?;
    let value = Some(value.to_owned());
    match field {
        "api_key" => cfg.credentials.api_key = value,
        "api_secret" => cfg.credentials.api_secret = value,
        _ => cfg.credentials.app_key = value,
    }
    Ok(())
}

// ── Translation to SessionConfig ────────────────────────────────────

/// Build a `SessionConfig` from the config file, resolving credentials.
pub fn to_session_config(cfg: &Config) -> SessionConfig {
    session_config_with(cfg, resolve_credentials(cfg))
}

/// Build a `SessionConfig` with already-resolved credentials.
pub fn session_config_with(cfg: &Config, credentials: SessionCredentials) -> SessionConfig {
    let tls = if cfg.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    SessionConfig {
        credentials,
        token_endpoint: cfg.token_endpoint.clone(),
        token_safety_margin: Duration::from_secs(cfg.token_safety_margin),
        tls,
        timeout: Duration::from_secs(cfg.timeout),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn exposed(secret: Option<&SecretString>) -> Option<&str> {
        secret.map(|s| s.expose_secret())
    }

    #[test]
    fn credential_chain_prefers_env_then_keyring_then_plaintext() {
        let cfg = Config {
            credentials: Credentials {
                api_key: Some("plain-key".into()),
                api_secret: Some("plain-secret".into()),
                app_key: Some("plain-app".into()),
            },
            ..Config::default()
        };

        let creds = resolve_credentials_with(
            &cfg,
            |field| (field == "api_key").then(|| "env-key".to_string()),
            |field| (field != "app_key").then(|| "ring".to_string()),
        );

        assert_eq!(exposed(creds.api_key.as_ref()), Some("env-key"));
        assert_eq!(exposed(creds.api_secret.as_ref()), Some("ring"));
        assert_eq!(exposed(creds.app_key.as_ref()), Some("plain-app"));
    }

    #[test]
    fn missing_and_blank_credentials_stay_unset() {
        let cfg = Config {
            credentials: Credentials {
                api_key: Some("  ".into()),
                ..Credentials::default()
            },
            ..Config::default()
        };
        let creds = resolve_credentials_with(&cfg, |_| None, |_| Some(String::new()));
        assert!(creds.api_key.is_none());
        assert!(!creds.is_complete());
    }

    #[test]
    fn plaintext_credential_rejects_unknown_field() {
        let mut cfg = Config::default();
        set_plaintext_credential(&mut cfg, "api_secret", "s").unwrap();
        assert_eq!(cfg.credentials.api_secret.as_deref(), Some("s"));
        assert!(matches!(
            set_plaintext_credential(&mut cfg, "password", "x"),
            Err(ConfigError::UnknownCredential(_))
        ));
    }

    #[test]
    fn selection_round_trips_warehouse() {
        let mut sel = Selection::default();
        assert_eq!(sel.warehouse(), None);

        let w = Warehouse {
            warehouse_id: "W1".into(),
            warehouse_name: "Main".into(),
        };
        sel.set_warehouse(Some(&w));
        assert_eq!(sel.warehouse(), Some(w));

        sel.set_warehouse(None);
        assert_eq!(sel.warehouse_id, None);
    }

    #[test]
    fn session_config_tls_selection() {
        let mut cfg = Config::default();
        assert_eq!(
            session_config_with(&cfg, SessionCredentials::default()).tls,
            TlsVerification::SystemDefaults
        );

        cfg.ca_cert = Some("/tmp/ca.pem".into());
        assert!(matches!(
            session_config_with(&cfg, SessionCredentials::default()).tls,
            TlsVerification::CustomCa(_)
        ));

        cfg.insecure = true;
        assert_eq!(
            session_config_with(&cfg, SessionCredentials::default()).tls,
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn env_var_and_keyring_names() {
        assert_eq!(credential_env_var("api_secret"), "STOCKER_API_SECRET");
        assert_eq!(credential_keyring_key("app_key"), "credentials/app_key");
    }
}
