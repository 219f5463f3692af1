// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::diagnostic::ConfigError;
use courier_config::model::CourierConfig;
use courier_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_courier_config() {
    let toml = r#"
[log]
level = "debug"

[session]
address = "10.0.0.5:9000"
request_full_sync = true

[record_store]
url = "https://records.example.com"
events_path = "/api/collections/wa_events/records"
errors_path = "/api/collections/wa_errors/records"

[history]
path = "/var/lib/courier/history"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.session.address, "10.0.0.5:9000");
    assert!(config.session.request_full_sync);
    assert_eq!(
        config.record_store.events_url(),
        "https://records.example.com/api/collections/wa_events/records"
    );
    assert_eq!(config.history.path, "/var/lib/courier/history");
}

/// An empty file yields the compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config, CourierConfig::default());
    assert_eq!(config.log.level, "info");
    assert_eq!(config.session.address, "127.0.0.1:7583");
    assert!(!config.session.request_full_sync);
    assert_eq!(config.record_store.url, "http://pocketbase:8090");
    assert_eq!(
        config.record_store.errors_url(),
        "http://pocketbase:8090/api/collections/errors/records"
    );
    assert_eq!(config.history.path, "ws_data/history");
}

/// A misspelled key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn typo_in_section_suggests_correction() {
    let toml = r#"
[session]
adress = "127.0.0.1:1"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "adress");
            assert_eq!(suggestion.as_deref(), Some("address"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value types are reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[session]
request_full_sync = "yes"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string for bool");
    assert!(
        matches!(errors[0], ConfigError::InvalidType { .. }),
        "got: {errors:?}"
    );
}

/// Semantic problems surface after successful parsing.
#[test]
fn validation_runs_after_parsing() {
    let toml = r#"
[record_store]
url = "pocketbase:8090"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject URL without scheme");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

/// Environment variables override file values, including underscore sections.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[record_store]
url = "http://from-file:8090"

[history]
path = "file-history"
"#,
        )?;
        jail.set_env("COURIER_RECORD_STORE_URL", "http://from-env:8090");
        jail.set_env("COURIER_SESSION_REQUEST_FULL_SYNC", "true");

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.record_store.url, "http://from-env:8090");
        assert!(config.session.request_full_sync);
        assert_eq!(config.history.path, "file-history");
        Ok(())
    });
}

/// A file named with `--config` must exist; the hierarchy files need not.
#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let errors = load_and_validate_path(&dir.path().join("absent.toml"))
        .expect_err("missing explicit file should fail");
    assert!(matches!(errors[0], ConfigError::Other(_)), "got: {errors:?}");
}
