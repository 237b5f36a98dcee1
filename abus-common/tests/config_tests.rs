//! Configuration file resolution
//!
//! Tests that manipulate ABUS_CONFIG are marked #[serial] so they never run
//! in parallel with each other.

use abus_common::config::{Config, ConfigResolver, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
#[serial]
fn test_env_var_is_first_candidate() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/abus-test/config.toml");

    let resolver = ConfigResolver::new();
    assert_eq!(
        resolver.candidates()[0],
        PathBuf::from("/tmp/abus-test/config.toml")
    );
    assert_eq!(
        resolver.candidates().last().unwrap(),
        &PathBuf::from("/etc/abus/config.toml")
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abus.toml");
    std::fs::write(&path, "[call]\nport = 6001\nstop_name = \"테스트 정류장\"\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = Config::load(None).unwrap();
    assert_eq!(config.call.port, 6001);
    assert_eq!(config.call.stop_name, "테스트 정류장");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("env.toml");
    let cli_path = dir.path().join("cli.toml");
    std::fs::write(&env_path, "[stop]\nport = 7000\n").unwrap();
    std::fs::write(&cli_path, "[stop]\nport = 7100\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &env_path);

    let config = Config::load(Some(&cli_path)).unwrap();
    assert_eq!(config.stop.port, 7100);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_cli_path_is_an_error() {
    let result = Config::load(Some(std::path::Path::new("/nonexistent/abus.toml")));
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[call\nport = ").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_shipped_site_file_matches_defaults() {
    let config = Config::from_toml(include_str!("../../config/abus.toml")).unwrap();
    let defaults = Config::default();

    assert_eq!(config.route_table().unwrap(), defaults.route_table().unwrap());
    assert_eq!(config.call.peers, defaults.call.peers);
    assert_eq!(config.call.port, 5001);
    assert_eq!(config.stop.release_url, defaults.stop.release_url);
    assert_eq!(config.detection.confidence_threshold, 0.30);
    assert_eq!(
        config.detection.input_channel_order,
        defaults.detection.input_channel_order
    );
    assert_eq!(config.bus.call_timeout_ms, defaults.bus.call_timeout_ms);
}
