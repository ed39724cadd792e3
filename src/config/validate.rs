// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `source` and `dist` are distinct, non-empty paths
/// - the two server ports are non-zero and distinct
/// - style entries are plain names (no path separators, no extension)
/// - image options are within the ranges the underlying encoders accept
/// - `queue_length >= 1`
///
/// It does **not** check that the source tree exists; a glob that matches
/// nothing is a valid (empty) build.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_styles(cfg)?;
    validate_images(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &ConfigFile) -> Result<()> {
    if cfg.paths.source.is_empty() {
        return Err(anyhow!("[paths].source must not be empty"));
    }
    if cfg.paths.dist.is_empty() {
        return Err(anyhow!("[paths].dist must not be empty"));
    }
    if cfg.paths.source == cfg.paths.dist {
        return Err(anyhow!(
            "[paths].source and [paths].dist must differ (both are '{}')",
            cfg.paths.source
        ));
    }
    Ok(())
}

fn validate_server(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.dev_port == 0 || cfg.server.dist_port == 0 {
        return Err(anyhow!("[server] ports must be non-zero"));
    }
    if cfg.server.dev_port == cfg.server.dist_port {
        return Err(anyhow!(
            "[server].dev_port and [server].dist_port must differ (both are {})",
            cfg.server.dev_port
        ));
    }
    Ok(())
}

fn validate_styles(cfg: &ConfigFile) -> Result<()> {
    for entry in &cfg.styles.entries {
        if entry.is_empty() {
            return Err(anyhow!("[styles].entries must not contain empty names"));
        }
        if entry.contains('/') || entry.contains('\\') || entry.contains('.') {
            return Err(anyhow!(
                "[styles].entries contains '{}': entries are bare names, \
                 resolved as <source>/styles/<name>.scss",
                entry
            ));
        }
    }
    Ok(())
}

fn validate_images(cfg: &ConfigFile) -> Result<()> {
    if cfg.images.png_level > 6 {
        return Err(anyhow!(
            "[images].png_level must be 0..=6 (got {})",
            cfg.images.png_level
        ));
    }
    if cfg.images.jpeg_quality == 0 || cfg.images.jpeg_quality > 100 {
        return Err(anyhow!(
            "[images].jpeg_quality must be 1..=100 (got {})",
            cfg.images.jpeg_quality
        ));
    }
    if !(0.0..=100.0).contains(&cfg.images.webp_quality) {
        return Err(anyhow!(
            "[images].webp_quality must be 0.0..=100.0 (got {})",
            cfg.images.webp_quality
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.queue_length == 0 {
        return Err(anyhow!("[watch].queue_length must be >= 1 (got 0)"));
    }
    Ok(())
}
