//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const REDACTED: &str = "****";

/// Copy of the config with every credential masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    let mask = |v: &mut Option<String>| {
        if v.is_some() {
            *v = Some(REDACTED.into());
        }
    };
    mask(&mut cfg.credentials.api_key);
    mask(&mut cfg.credentials.api_secret);
    mask(&mut cfg.credentials.app_key);
    cfg
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Where each credential would currently come from.
fn credential_sources(cfg: &Config) -> Vec<String> {
    stocker_config::CREDENTIAL_FIELDS
        .iter()
        .map(|field| {
            let env = stocker_config::credential_env_var(field);
            let plaintext = match *field {
                "api_key" => cfg.credentials.api_key.is_some(),
                "api_secret" => cfg.credentials.api_secret.is_some(),
                _ => cfg.credentials.app_key.is_some(),
            };
            let source = if std::env::var(&env).is_ok_and(|v| !v.trim().is_empty()) {
                format!("env ({env})")
            } else if plaintext {
                "config file".into()
            } else {
                "keyring or unset".into()
            };
            format!("# {field}: {source}")
        })
        .collect()
}

/// TOML rendering of the redacted config, followed by credential sources.
fn show_text(shown: &Config, cfg: &Config) -> Result<String, CliError> {
    let mut text = toml::to_string_pretty(shown).map_err(stocker_config::ConfigError::from)?;
    text.push('\n');
    text.push_str(&credential_sources(cfg).join("\n"));
    Ok(text)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let shown = redacted(&cfg);
            let detail = show_text(&shown, &cfg)?;
            let out = output::render_single(
                &global.output,
                &shown,
                |_| detail.clone(),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetCredential {
            field,
            value,
            plaintext,
        } => {
            let value = match value {
                Some(v) => v,
                None => rpassword::prompt_password(format!("{field}: ")).map_err(prompt_err)?,
            };
            if value.trim().is_empty() {
                return Err(CliError::Validation {
                    field: field.clone(),
                    reason: "value cannot be empty".into(),
                });
            }

            if plaintext {
                let mut cfg = config::load_config()?;
                stocker_config::set_plaintext_credential(&mut cfg, &field, value.trim())?;
                config::save_config(&cfg)?;
                if !global.quiet {
                    eprintln!("{field} saved to {}", config::config_path().display());
                }
            } else {
                stocker_config::store_credential(&field, value.trim())?;
                if !global.quiet {
                    eprintln!("{field} stored in system keyring");
                }
            }
            Ok(())
        }
    }
}
