// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Load a configuration file from a given path and return the raw
/// `ConfigFile`.
///
/// A missing file is not an error: the defaults describe the conventional
/// `app/` → `dist/` layout, so projects without a `Siteforge.toml` build with
/// the stock task table. Use [`load_and_validate`] for the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    if !path.exists() {
        debug!(?path, "no config file; using defaults");
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML (or falls back to full defaults when the file is absent).
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks port, style-entry and image-option sanity.
///
/// Task-graph validation happens separately against the built registry.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Helper to resolve the default config path: `Siteforge.toml` in the
/// current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Siteforge.toml")
}
