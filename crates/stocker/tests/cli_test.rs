//! Integration tests for the `stocker` CLI binary.
//!
//! Each test points `STOCKER_CONFIG` at a temporary file so the user's real
//! configuration is never touched.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const QR_TEXT: &str = "Company: Acme\nEmployee_Code: E1\nUser_id: u@x.com\nFull_Name: Jane Doe\nAPI: https://host:443/api/method/x";

/// Build a [`Command`] for the `stocker` binary with env isolation.
fn stocker_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("stocker");
    cmd.env("STOCKER_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("STOCKER_BASE_URL")
        .env_remove("STOCKER_OUTPUT")
        .env_remove("STOCKER_API_KEY")
        .env_remove("STOCKER_API_SECRET")
        .env_remove("STOCKER_APP_KEY")
        .env_remove("STOCKER_TIMEOUT")
        .env_remove("STOCKER_INSECURE")
        .env_remove("RUST_LOG");
    cmd
}

fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = temp_config();
    let output = stocker_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let (_dir, config) = temp_config();
    stocker_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("login")
            .and(predicate::str::contains("warehouses"))
            .and(predicate::str::contains("entries")),
    );
}

#[test]
fn test_completions_bash() {
    let (_dir, config) = temp_config();
    stocker_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stocker"));
}

#[test]
fn test_config_path_honors_env() {
    let (_dir, config) = temp_config();
    stocker_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Login ───────────────────────────────────────────────────────────

#[test]
fn test_login_persists_profile() {
    let (_dir, config) = temp_config();

    stocker_cmd(&config)
        .args(["login", &STANDARD.encode(QR_TEXT)])
        .assert()
        .success()
        .stderr(predicate::str::contains("Jane Doe"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("base_url = \"https://host\""), "{saved}");

    stocker_cmd(&config)
        .args(["whoami", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"user_id\": \"u@x.com\""));

    stocker_cmd(&config).arg("logout").assert().success();
    stocker_cmd(&config).arg("whoami").assert().code(3);
}

#[test]
fn test_invalid_qr_is_usage_error() {
    let (_dir, config) = temp_config();
    stocker_cmd(&config)
        .args(["login", &STANDARD.encode("Company: Acme\n")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid QR code"));
    assert!(!config.exists());
}

#[test]
fn test_server_commands_require_login() {
    let (_dir, config) = temp_config();
    stocker_cmd(&config)
        .args(["warehouses", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_warehouses_list_fetches_token_then_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/method/gpos.gpos.pos.generate_token_secure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "access_token": "tok", "expires_in": 3600 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/method/stocker.stocker.api.warehouse_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "warehouse_id": "W1", "warehouse_name": "Main" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = temp_config();
    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        stocker_cmd(&config)
            .env("STOCKER_API_KEY", "key")
            .env("STOCKER_API_SECRET", "secret")
            .env("STOCKER_APP_KEY", "app")
            .args(["--base-url", &uri, "warehouses", "list", "-o", "plain"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "W1");
}
