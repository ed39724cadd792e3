// src/pipeline/styles.rs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::{debug, info};

use crate::pipeline::{write_output, PipelineCtx, TransformSummary};
use crate::registry::TaskBody;

/// Compile each configured entry stylesheet: SCSS → CSS with `@import`
/// resolution against the styles directory, then vendor prefixes and
/// minification for the supported browser matrix.
///
/// Entries without a source file are skipped (an absent input is an empty
/// input, not an error); a malformed stylesheet fails the task with the
/// compiler's source location in the message.
pub fn run_sync(ctx: &PipelineCtx) -> Result<TransformSummary> {
    let styles_dir = ctx.source.join("styles");
    let out_dir = ctx.dist.join("styles");

    let mut summary = TransformSummary::default();

    for entry in &ctx.styles.entries {
        let src = styles_dir.join(format!("{entry}.scss"));
        if !src.is_file() {
            debug!(entry = %entry, "no source for style entry; skipping");
            continue;
        }

        let css = compile_entry(&src, &styles_dir)?;
        let minified = prefix_and_minify(&css, entry)?;

        write_output(&out_dir.join(format!("{entry}.css")), minified.as_bytes())?;
        summary.written += 1;
    }

    Ok(summary)
}

/// SCSS compilation. grass resolves `@import`/`@use` partials against the
/// styles directory.
fn compile_entry(src: &Path, styles_dir: &Path) -> Result<String> {
    let options = grass::Options::default().load_path(styles_dir);
    grass::from_path(src, &options)
        .map_err(|err| anyhow!("compiling {:?}: {}", src, err))
}

/// Vendor-prefix and minify plain CSS for the supported browsers.
fn prefix_and_minify(css: &str, entry: &str) -> Result<String> {
    let targets = || Targets {
        browsers: Some(supported_browsers()),
        ..Targets::default()
    };

    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: format!("{entry}.scss"),
            ..ParserOptions::default()
        },
    )
    .map_err(|err| anyhow!("parsing compiled css for '{entry}': {err}"))?;

    stylesheet
        .minify(MinifyOptions {
            targets: targets(),
            ..MinifyOptions::default()
        })
        .map_err(|err| anyhow!("minifying css for '{entry}': {err}"))?;

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets: targets(),
            ..PrinterOptions::default()
        })
        .map_err(|err| anyhow!("printing css for '{entry}': {err}"))?;

    Ok(output.code)
}

/// The browser matrix stylesheets are prefixed for. Versions are encoded
/// as `major << 16 | minor << 8`.
fn supported_browsers() -> Browsers {
    Browsers {
        ie: Some(version(10, 0)),
        firefox: Some(version(30, 0)),
        chrome: Some(version(34, 0)),
        safari: Some(version(7, 0)),
        opera: Some(version(23, 0)),
        ios_saf: Some(version(7, 0)),
        android: Some(version(4, 4)),
        ..Browsers::default()
    }
}

const fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

pub struct StylesTask;

#[async_trait]
impl TaskBody for StylesTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let summary = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("styles worker panicked")??;
        info!(written = summary.written, "stylesheets compiled");
        Ok(())
    }
}
