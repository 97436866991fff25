#![allow(clippy::unwrap_used)]
// Config file loading and saving against a temporary directory.

use pretty_assertions::assert_eq;

use stocker_config::{
    Config, Credentials, LoginState, Selection, load_config_from, save_config_to,
};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.token_endpoint, "gpos.gpos.pos.generate_token_secure");
    assert_eq!(cfg.token_safety_margin, 30);
    assert_eq!(cfg.timeout, 30);
    assert!(cfg.login.is_none());
}

#[test]
fn save_then_load_keeps_login_and_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = Config {
        timeout: 12,
        credentials: Credentials {
            api_key: Some("k".into()),
            ..Credentials::default()
        },
        login: Some(LoginState {
            company: "Acme".into(),
            employee_code: "E1".into(),
            user_id: "u@x.com".into(),
            full_name: "Jane Doe".into(),
            api: "https://host:443/api/method/x".into(),
            base_url: "https://host".into(),
        }),
        selection: Selection {
            warehouse_id: Some("W1".into()),
            warehouse_name: Some("Main".into()),
            shelf: Some("A1".into()),
        },
        ..Config::default()
    };

    save_config_to(&path, &cfg).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded, cfg);
    let profile = loaded.login.unwrap().to_profile().unwrap();
    assert_eq!(profile.base_url.as_str(), "https://host/");
}

#[test]
fn hand_written_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
token_endpoint = "custom.token"
insecure = true

[selection]
warehouse_id = "W9"
"#,
    )
    .unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.token_endpoint, "custom.token");
    assert!(cfg.insecure);
    assert_eq!(cfg.selection.warehouse().unwrap().warehouse_id, "W9");
    assert_eq!(cfg.timeout, 30);
}

#[test]
fn invalid_login_url_is_reported() {
    let state = LoginState {
        company: "Acme".into(),
        employee_code: "E1".into(),
        user_id: "u".into(),
        full_name: "J".into(),
        api: String::new(),
        base_url: "not a url".into(),
    };
    assert!(state.to_profile().is_err());
}
