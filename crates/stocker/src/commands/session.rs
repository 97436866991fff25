//! Login, logout, whoami and token handlers.

use chrono::Utc;
use serde::Serialize;

use stocker_core::{Session, parse_qr_payload};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, LoginState, Selection};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Identity {
    company: String,
    employee_code: String,
    user_id: String,
    full_name: String,
    server: String,
    warehouse: Option<String>,
    shelf: Option<String>,
}

impl Identity {
    fn detail(&self, color: bool) -> String {
        [
            ("Name", self.full_name.as_str()),
            ("User", self.user_id.as_str()),
            ("Employee", self.employee_code.as_str()),
            ("Company", self.company.as_str()),
            ("Server", self.server.as_str()),
            ("Warehouse", self.warehouse.as_deref().unwrap_or("-")),
            ("Shelf", self.shelf.as_deref().unwrap_or("-")),
        ]
        .iter()
        .map(|(label, value)| output::detail_line(label, value, color))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

#[derive(Serialize)]
struct TokenInfo {
    token: String,
    expires_at: String,
    expires_in_secs: i64,
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn login(args: &LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let payload = match (&args.payload, &args.file) {
        (Some(payload), _) => payload.clone(),
        (None, Some(path)) => util::read_payload(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "payload".into(),
                reason: "pass the QR payload or --file".into(),
            });
        }
    };

    let profile = parse_qr_payload(&payload)?;
    let mut cfg = config::load_config()?;

    let state = LoginState::from_profile(&profile);
    let same_server = cfg
        .login
        .as_ref()
        .is_some_and(|old| old.base_url == state.base_url);
    if !same_server {
        cfg.selection = Selection::default();
    }
    let server = state.base_url.clone();
    cfg.login = Some(state);
    config::save_config(&cfg)?;

    tracing::info!(user = %profile.user_id, server = %profile.base_url, "login saved");
    if !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!(
            "{}",
            output::success(
                &format!(
                    "Logged in as {} ({}) on {server}",
                    profile.full_name, profile.company
                ),
                color
            )
        );
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    if cfg.login.is_none() {
        return Err(CliError::NotLoggedIn);
    }
    cfg.login = None;
    cfg.selection = Selection::default();
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("Logged out");
    }
    Ok(())
}

pub fn whoami(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let login = cfg.login.as_ref().ok_or(CliError::NotLoggedIn)?;
    let server = config::base_url_override(global)?
        .map_or_else(|| login.base_url.clone(), |u| u.to_string());

    let identity = Identity {
        company: login.company.clone(),
        employee_code: login.employee_code.clone(),
        user_id: login.user_id.clone(),
        full_name: login.full_name.clone(),
        server,
        warehouse: cfg.selection.warehouse().map(|w| w.label().to_owned()),
        shelf: cfg.selection.shelf.clone(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &identity,
        |i| i.detail(color),
        |i| i.user_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn token(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.refresh_token().await?;
    let token = session
        .api()
        .tokens()
        .get()
        .ok_or_else(|| CliError::AuthFailed {
            message: "token endpoint returned no token".into(),
        })?;

    let info = TokenInfo {
        token: token.masked(),
        expires_at: token.expires_at().to_rfc3339(),
        expires_in_secs: token.remaining(Utc::now()).num_seconds(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &info,
        |t| {
            [
                output::detail_line("Token", &t.token, color),
                output::detail_line("Expires", &t.expires_at, color),
                output::detail_line("Expires in", &format!("{}s", t.expires_in_secs), color),
            ]
            .join("\n")
        },
        |t| t.expires_at.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
