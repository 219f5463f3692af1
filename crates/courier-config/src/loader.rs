// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/courier/courier.toml`
//! 3. `~/.config/courier/courier.toml`
//! 4. `./courier.toml`
//! 5. `COURIER_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::model::CourierConfig;

pub const SYSTEM_CONFIG: &str = "/etc/courier/courier.toml";
pub const LOCAL_CONFIG: &str = "courier.toml";

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("courier").join("courier.toml"))
}

/// The TOML files consulted by [`load_config`], lowest precedence first.
pub fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(SYSTEM_CONFIG)];
    files.extend(user_config_path());
    files.push(PathBuf::from(LOCAL_CONFIG));
    files
}

/// Builds the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(CourierConfig::default()));
    for file in config_files() {
        if file.exists() {
            debug!(path = %file.display(), "merging config file");
        }
        figment = figment.merge(Toml::file(file));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard file hierarchy with env var overrides.
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from one explicit file, still honoring env vars.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// `COURIER_RECORD_STORE_URL` maps to `record_store.url`.
///
/// Sections are mapped explicitly because both section and key names contain
/// underscores, which `Env::split("_")` cannot disambiguate.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        let mapped = ["record_store", "session", "history", "log"]
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key);
        mapped.into()
    })
}
