// src/pipeline/mod.rs

//! Asset transforms.
//!
//! Each submodule is one transform task: select inputs by glob, run one
//! transformation through the crate that owns it, write outputs under the
//! destination tree. Transforms are independent and idempotent; they share
//! only the [`PipelineCtx`] and the convention that every task writes a
//! disjoint part of the output tree.

pub mod cache;
pub mod clean;
pub mod html;
pub mod images;
pub mod lint;
pub mod scripts;
pub mod styles;
pub mod webp;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{ConfigFile, ImagesSection, StylesSection};

/// Shared context handed to every task body: resolved paths plus the
/// transform settings. Built once at startup from the loaded config; this
/// is the explicit configuration object the whole pipeline works from.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    /// Project root (the directory holding the config file).
    pub root: PathBuf,
    /// Source tree (`<root>/app` by default).
    pub source: PathBuf,
    /// Output tree (`<root>/dist` by default).
    pub dist: PathBuf,
    pub styles: StylesSection,
    pub images: ImagesSection,
    /// Content-cache file for transforms that opt into caching.
    pub cache_file: PathBuf,
}

impl PipelineCtx {
    pub fn new(root: impl Into<PathBuf>, cfg: &ConfigFile) -> Self {
        let root = root.into();
        Self {
            source: root.join(&cfg.paths.source),
            dist: root.join(&cfg.paths.dist),
            styles: cfg.styles.clone(),
            images: cfg.images.clone(),
            cache_file: root.join(".siteforge").join("cache"),
            root,
        }
    }
}

/// What a transform did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Outputs written this run.
    pub written: usize,
    /// Inputs skipped as unchanged (content cache).
    pub skipped: usize,
}

/// Select files under `base` matching `pattern` (a relative glob).
///
/// A base directory that does not exist, or a pattern that matches nothing,
/// yields an empty set; that is a valid (empty) transform input.
pub fn select_files(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = base.join(pattern);
    let full = full.to_string_lossy();

    let mut files = Vec::new();
    for entry in glob::glob(&full).with_context(|| format!("invalid glob pattern {full}"))? {
        let path = entry.context("reading glob match")?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Mirror `input` (which lives under `source_root`) into `dist_root`.
pub fn mirrored_output(source_root: &Path, dist_root: &Path, input: &Path) -> Result<PathBuf> {
    let rel = input.strip_prefix(source_root).with_context(|| {
        format!(
            "input {:?} is not under source root {:?}",
            input, source_root
        )
    })?;
    Ok(dist_root.join(rel))
}

/// Path of `input` relative to `root`, with forward slashes. Used as a
/// cache key and in log lines.
pub fn relative_key(root: &Path, input: &Path) -> String {
    input
        .strip_prefix(root)
        .unwrap_or(input)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Write `bytes` to `path`, creating intermediate directories as needed.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing output file {:?}", path))
}
