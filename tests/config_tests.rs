#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::sync::Mutex;
use switchyard::config::{AppConfig, ConfigError, DEFAULT_STACK_SIZE};
use switchyard::logging::LogFormat;

// Env vars are process-global; serialize the tests that touch them.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_VARS: &[&str] = &[
    "SWITCHYARD_WORKERS",
    "SWITCHYARD_STACK_SIZE",
    "SWITCHYARD_METHOD_NOT_ALLOWED",
    "SWITCHYARD_LOG_LEVEL",
    "SWITCHYARD_LOG_FORMAT",
    "SWITCHYARD_LOG_TARGET_FILTER",
    "SWITCHYARD_LOG_INCLUDE_LOCATION",
];

fn clean_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml() {
    let file = write_config(
        ".yaml",
        r#"
handle_method_not_allowed: true
not_found_body: "no such route"
workers: 8
stack_size: "0x20000"
log:
  level: debug
  format: pretty
"#,
    );
    let config = AppConfig::load(file.path()).unwrap();
    assert!(config.handle_method_not_allowed);
    assert_eq!(config.not_found_body.as_deref(), Some("no such route"));
    assert_eq!(config.workers, 8);
    assert_eq!(config.stack_size, 0x20000);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.format, LogFormat::Pretty);
}

#[test]
fn test_load_toml_with_partial_fields() {
    let file = write_config(
        ".toml",
        r#"
workers = 2

[log]
level = "warn"
"#,
    );
    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.workers, 2);
    assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
    assert!(!config.handle_method_not_allowed);
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.log.format, LogFormat::Json);
}

#[test]
fn test_empty_yaml_is_default() {
    let file = write_config(".yml", "");
    assert_eq!(AppConfig::load(file.path()).unwrap(), AppConfig::default());
}

#[test]
fn test_unknown_extension_rejected() {
    let file = write_config(".ini", "workers=1");
    assert!(matches!(
        AppConfig::load(file.path()),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_invalid_yaml_reports_path() {
    let file = write_config(".yaml", "workers: [not, a, number]");
    let err = AppConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        AppConfig::load("/definitely/not/here.yaml"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_env_overrides_file_values() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clean_env();

    let file = write_config(".yaml", "workers: 8\n");
    let mut config = AppConfig::load(file.path()).unwrap();
    std::env::set_var("SWITCHYARD_WORKERS", "16");
    std::env::set_var("SWITCHYARD_STACK_SIZE", "0x4000");
    std::env::set_var("SWITCHYARD_METHOD_NOT_ALLOWED", "true");
    std::env::set_var("SWITCHYARD_LOG_FORMAT", "pretty");
    let result = config.apply_env();
    clean_env();

    result.unwrap();
    assert_eq!(config.workers, 16);
    assert_eq!(config.stack_size, 0x4000);
    assert!(config.handle_method_not_allowed);
    assert_eq!(config.log.format, LogFormat::Pretty);
}

#[test]
fn test_invalid_env_value_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clean_env();

    std::env::set_var("SWITCHYARD_WORKERS", "many");
    let result = AppConfig::from_env();
    clean_env();

    match result {
        Err(ConfigError::InvalidEnv { var, value }) => {
            assert_eq!(var, "SWITCHYARD_WORKERS");
            assert_eq!(value, "many");
        }
        other => panic!("expected InvalidEnv, got {other:?}"),
    }
}

#[test]
fn test_from_env_without_vars_is_default() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clean_env();
    assert_eq!(AppConfig::from_env().unwrap(), AppConfig::default());
}
