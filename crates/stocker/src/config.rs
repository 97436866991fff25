//! CLI configuration -- thin wrapper around `stocker_config`.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--base-url, --insecure, --timeout) and rebuilds a `Session` from the
//! persisted login and selection.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use stocker_core::{Session, SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use stocker_config::{
    Config, LoginState, Selection, config_path, load_config, save_config, to_session_config,
};

/// Translate the config file + global flags into a `SessionConfig`.
///
/// CLI flags take priority over file values.
pub fn resolve_session_config(cfg: &Config, global: &GlobalOpts) -> SessionConfig {
    let mut session_config = to_session_config(cfg);
    if global.insecure {
        session_config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        session_config.timeout = Duration::from_secs(secs);
    }
    if !session_config.credentials.is_complete() {
        warn!("app credentials incomplete; token requests are disabled");
    }
    session_config
}

/// Parse the `--base-url` override, if any.
pub fn base_url_override(global: &GlobalOpts) -> Result<Option<Url>, CliError> {
    global
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|raw| {
            Url::parse(raw).map_err(|e| CliError::Validation {
                field: "base-url".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })
        })
        .transpose()
}

/// Build a session from persisted state: login, server override, then
/// the saved warehouse and shelf. No network I/O happens here.
pub fn build_session(cfg: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let session = Session::new(resolve_session_config(cfg, global))?;

    if let Some(login) = &cfg.login {
        session.restore(login.to_profile()?);
    }
    if let Some(url) = base_url_override(global)? {
        session.override_base_url(url);
    }
    if session.api().base_url().get().is_none() {
        return Err(CliError::NotLoggedIn);
    }

    session.restore_selection(cfg.selection.warehouse(), cfg.selection.shelf.as_deref());
    debug!(state = ?session.snapshot(), "session built");
    Ok(session)
}
