// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Courier bridge.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, `COURIER_*` environment
//! overrides, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use courier_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("record store: {}", config.record_store.url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CourierConfig;

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate() -> Result<CourierConfig, Vec<ConfigError>> {
    let sources = read_sources(&loader::config_files());
    finish(loader::load_config(), &sources)
}

/// Load configuration from one explicit file and validate it.
///
/// Unlike the hierarchy, an explicitly named file must exist.
pub fn load_and_validate_path(path: &Path) -> Result<CourierConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::Other(format!(
            "config file {} does not exist",
            path.display()
        ))]);
    }
    let sources = read_sources(&[path.to_path_buf()]);
    finish(loader::load_config_from_path(path), &sources)
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<CourierConfig, Vec<ConfigError>> {
    let sources = vec![("<inline>".to_string(), toml_content.to_string())];
    finish(loader::load_config_from_str(toml_content), &sources)
}

fn finish(
    loaded: Result<CourierConfig, figment::Error>,
    sources: &[(String, String)],
) -> Result<CourierConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, sources)),
    }
}

/// Reads the files that exist, keyed by the path Figment reports for them.
fn read_sources(files: &[std::path::PathBuf]) -> Vec<(String, String)> {
    files
        .iter()
        .filter_map(|file| {
            let content = std::fs::read_to_string(file).ok()?;
            let path = std::fs::canonicalize(file).unwrap_or_else(|_| file.clone());
            Some((path.display().to_string(), content))
        })
        .collect()
}
