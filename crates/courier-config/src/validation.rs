// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` must be one of: {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    validate_address(&config.session.address, &mut errors);

    let url = config.record_store.url.trim();
    let scheme_ok = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .is_some_and(|host| !host.is_empty());
    if !scheme_ok {
        errors.push(ConfigError::validation(format!(
            "record_store.url `{url}` must be an http:// or https:// URL"
        )));
    }

    let paths = [
        ("record_store.events_path", &config.record_store.events_path),
        ("record_store.errors_path", &config.record_store.errors_path),
    ];
    for (key, path) in paths {
        if !path.starts_with('/') {
            errors.push(ConfigError::validation(format!(
                "{key} `{path}` must start with `/`"
            )));
        }
    }
    if config.record_store.events_path == config.record_store.errors_path {
        errors.push(ConfigError::validation(
            "record_store.events_path and record_store.errors_path must differ",
        ));
    }

    if config.history.path.trim().is_empty() {
        errors.push(ConfigError::validation("history.path must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_address(address: &str, errors: &mut Vec<ConfigError>) {
    let Some((host, port)) = address.trim().rsplit_once(':') else {
        errors.push(ConfigError::validation(format!(
            "session.address `{address}` must be in host:port form"
        )));
        return;
    };
    if host.is_empty() {
        errors.push(ConfigError::validation(format!(
            "session.address `{address}` has an empty host"
        )));
    }
    if port.parse::<u16>().map_or(true, |p| p == 0) {
        errors.push(ConfigError::validation(format!(
            "session.address `{address}` has an invalid port `{port}`"
        )));
    }
}
