//! Unit tests for translator configuration loading
//!
//! Environment tests are serialized since they share the process environment.

use std::io::Write;

use cypher_pgsql::config::DEFAULT_SHORTEST_PATH_MAX_DEPTH;
use cypher_pgsql::{ConfigError, TranslatorConfig};
use serial_test::serial;
use tempfile::NamedTempFile;

const ENV_KEYS: [&str; 3] = [
    "CYPHER_PGSQL_STRIP_LITERALS",
    "CYPHER_PGSQL_SHORTEST_PATH_MAX_DEPTH",
    "CYPHER_PGSQL_ASSERT_KINDS",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write yaml");
    file
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = TranslatorConfig::from_env().expect("defaults are valid");
    assert_eq!(config, TranslatorConfig::default());
    assert_eq!(config.shortest_path_max_depth, DEFAULT_SHORTEST_PATH_MAX_DEPTH);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("CYPHER_PGSQL_STRIP_LITERALS", "true");
    std::env::set_var("CYPHER_PGSQL_SHORTEST_PATH_MAX_DEPTH", "25");
    std::env::set_var("CYPHER_PGSQL_ASSERT_KINDS", "true");

    let config = TranslatorConfig::from_env();
    clear_env();

    let config = config.expect("overrides are valid");
    assert!(config.strip_literals);
    assert!(config.assert_kinds);
    assert_eq!(config.shortest_path_max_depth, 25);
}

#[test]
#[serial]
fn test_from_env_rejects_unparseable_values() {
    clear_env();
    std::env::set_var("CYPHER_PGSQL_STRIP_LITERALS", "sometimes");

    let result = TranslatorConfig::from_env();
    clear_env();

    match result {
        Err(ConfigError::Parse { field, value, .. }) => {
            assert_eq!(field, "CYPHER_PGSQL_STRIP_LITERALS");
            assert_eq!(value, "sometimes");
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_from_env_validates_depth() {
    clear_env();
    std::env::set_var("CYPHER_PGSQL_SHORTEST_PATH_MAX_DEPTH", "0");

    let result = TranslatorConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_from_yaml_file() {
    let file = yaml_file(
        r#"
strip_literals: true
shortest_path_max_depth: 40
"#,
    );

    let config = TranslatorConfig::from_yaml_file(file.path()).expect("valid yaml");
    assert!(config.strip_literals);
    assert!(!config.assert_kinds, "unset fields fall back to defaults");
    assert_eq!(config.shortest_path_max_depth, 40);
}

#[test]
fn test_from_yaml_file_validates_depth() {
    let file = yaml_file("shortest_path_max_depth: 5000\n");

    assert!(matches!(
        TranslatorConfig::from_yaml_file(file.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_from_yaml_file_reports_bad_content() {
    let file = yaml_file("strip_literals: [not, a, bool]\n");

    match TranslatorConfig::from_yaml_file(file.path()) {
        Err(ConfigError::Parse { field, .. }) => assert_eq!(field, "yaml_content"),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_from_yaml_file_missing() {
    let dir = tempfile::tempdir().expect("temp dir");

    match TranslatorConfig::from_yaml_file(dir.path().join("absent.yaml")) {
        Err(ConfigError::Parse { field, .. }) => assert_eq!(field, "yaml_file"),
        other => panic!("expected a read error, got {:?}", other),
    }
}
