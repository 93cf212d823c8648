//! Configuration layers feeding a real mount table.

use std::path::Path;

use serde_json::{json, Map, Value};
use stashbox::config::ConfigError;
use stashbox::{Configuration, GatewayConfig, MountTable};

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write_config(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_mounts_build_a_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "stash.json",
        r#"{
            "PORT": 8080,
            "mounts": [
                { "mount": "/secret/key.pem", "provider": "env", "var": "KEY" },
                { "mount": "/", "provider": "file", "basePath": "stash" }
            ]
        }"#,
    );

    let configuration = Configuration::resolve_with_env(Map::new(), Some(&path), Vec::new()).unwrap();
    let config = GatewayConfig::from_configuration(&configuration).unwrap();
    assert_eq!(config.port, 8080);

    let table = MountTable::from_config(&config).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.route("/secret/key.pem").unwrap().mount.provider(), "env");
    assert_eq!(table.route("/docs/a.txt").unwrap().mount.provider(), "file");
}

#[test]
fn test_environment_mounts_replace_file_mounts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "stash.toml",
        r#"
PORT = 8080

[[mounts]]
mount = "/from-file"
provider = "file"
basePath = "stash"
"#,
    );

    let vars = env(&[
        ("STASHBOX__mounts__0__mount", "/from-env"),
        ("STASHBOX__mounts__0__provider", "env"),
        ("STASHBOX__mounts__0__var", "KEY"),
        ("STASHBOX__PORT", "9090"),
    ]);
    let mut overrides = Map::new();
    overrides.insert("PORT".to_string(), Value::from(9000));

    let configuration = Configuration::resolve_with_env(overrides, Some(&path), vars).unwrap();
    let config = GatewayConfig::from_configuration(&configuration).unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(
        config.mounts,
        vec![json!({ "mount": "/from-env", "provider": "env", "var": "KEY" })]
    );

    let table = MountTable::from_config(&config).unwrap();
    assert!(table.route("/from-file").is_none());
    assert!(table.route("/from-env").is_some());
}

#[test]
fn test_default_mount_when_nothing_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "empty.json", "{}");

    let configuration = Configuration::resolve_with_env(Map::new(), Some(&path), Vec::new()).unwrap();
    let config = GatewayConfig::from_configuration(&configuration).unwrap();
    assert_eq!(config.port, 80);

    let table = MountTable::from_config(&config).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.route("/anything").unwrap().mount.provider(), "file");
}

#[test]
fn test_driver_parameter_errors_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "bad.json",
        r#"{ "mounts": [ { "mount": "/k", "provider": "env", "var": "K", "encoding": "rot13" } ] }"#,
    );

    let configuration = Configuration::resolve_with_env(Map::new(), Some(&path), Vec::new()).unwrap();
    let config = GatewayConfig::from_configuration(&configuration).unwrap();
    assert!(matches!(
        MountTable::from_config(&config),
        Err(ConfigError::InvalidParameter { param: "encoding", .. })
    ));
}
