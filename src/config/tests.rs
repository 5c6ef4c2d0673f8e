use super::settings::Settings;
use super::{load_config, load_config_from};
use crate::utils::error::HubError;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.admin.port, 8081);
    assert!(settings.admin.token.is_none());
    assert_eq!(settings.broker.max_track_positions, 0);
    assert_eq!(settings.log.level, "info");
    assert_eq!(settings.server_addr(), "127.0.0.1:8080");
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [admin]
        token = "s3cret"

        [broker]
        max_track_positions = 500
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();
    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.admin.token.as_deref(), Some("s3cret"));
    // untouched sections keep their defaults
    assert_eq!(cfg.admin.port, 8081);
    assert_eq!(cfg.broker.max_track_positions, 500);
    assert_eq!(cfg.log.level, "info");
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("nope");
    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config_from failed");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.broker.max_track_positions, 0);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("hub.toml");
    fs::write(&path, "[server]\nport = 9000\n").expect("write config file");
    let base = tmp.path().join("hub");

    temp_env::with_vars(
        [
            ("SHUTTLEHUB_SERVER__PORT", Some("9100")),
            ("SHUTTLEHUB_LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config_from(base.to_str().unwrap()).expect("load_config_from failed");
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.log.level, "debug");
        },
    );
}

#[test]
#[serial]
fn empty_admin_token_is_treated_as_unset() {
    temp_env::with_var("SHUTTLEHUB_ADMIN__TOKEN", Some(""), || {
        let tmp = TempDir::new().expect("create tempdir");
        let path = tmp.path().join("none");
        let cfg = load_config_from(path.to_str().unwrap()).expect("load_config_from failed");
        assert!(cfg.admin.token.is_none());
    });
}

#[test]
#[serial]
fn invalid_value_is_a_config_error() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[server]\nport = \"not-a-port\"\n").expect("write config file");
    let base = tmp.path().join("bad");

    let err = load_config_from(base.to_str().unwrap()).expect_err("bad port accepted");
    assert!(matches!(err, HubError::Config(_)), "unexpected error: {err}");
}
