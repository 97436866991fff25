//! Shared helpers for command handlers.

use std::io::{IsTerminal, Read};
use std::path::Path;

use stocker_core::Session;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a QR payload from a file, or stdin for `-`.
pub fn read_payload(path: &Path) -> Result<String, CliError> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(contents.trim().to_owned())
}

/// `--warehouse` flag if given, else the selected warehouse's ID.
pub fn warehouse_or_selected(session: &Session, flag: Option<String>) -> Option<String> {
    flag.map(|w| w.trim().to_owned())
        .filter(|w| !w.is_empty())
        .or_else(|| session.warehouse().map(|w| w.warehouse_id))
}

/// Quantity for display: integers without decimals, `-` when unknown.
pub fn fmt_qty(qty: Option<f64>) -> String {
    match qty {
        Some(q) if q.fract().abs() < f64::EPSILON => format!("{q:.0}"),
        Some(q) => q.to_string(),
        None => "-".into(),
    }
}
