// src/pipeline/html.rs

use std::fs;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::info;

use crate::pipeline::{
    mirrored_output, relative_key, select_files, write_output, PipelineCtx, TransformSummary,
};
use crate::registry::TaskBody;

/// Resolve asset build blocks and minify every page under the source root,
/// writing results under the destination root with the same layout.
///
/// A build block
///
/// ```html
/// <!-- build:css styles/home.css -->
/// <link rel="stylesheet" href="styles/a.css">
/// <link rel="stylesheet" href="styles/b.css">
/// <!-- endbuild -->
/// ```
///
/// collapses to a single reference to the named output. Only references are
/// rewritten; emitting the referenced assets is the styles/scripts tasks'
/// job.
pub fn run_sync(ctx: &PipelineCtx) -> Result<TransformSummary> {
    let block = Regex::new(
        r"(?s)<!--\s*build:(css|js)\s+(\S+)\s*-->.*?<!--\s*endbuild\s*-->",
    )
    .context("compiling build-block pattern")?;

    let cfg = minify_config();
    let mut summary = TransformSummary::default();

    for input in select_files(&ctx.source, "**/*.html")? {
        let rel = relative_key(&ctx.source, &input);
        let page = fs::read_to_string(&input)
            .with_context(|| format!("reading page {:?}", input))?;

        let resolved = resolve_build_blocks(&block, &page);
        let minified = minify_html::minify(resolved.as_bytes(), &cfg);

        let output = mirrored_output(&ctx.source, &ctx.dist, &input)?;
        write_output(&output, &minified)?;

        info!(page = %rel, bytes = minified.len(), "page written");
        summary.written += 1;
    }

    Ok(summary)
}

fn resolve_build_blocks(block: &Regex, page: &str) -> String {
    block
        .replace_all(page, |caps: &Captures| match &caps[1] {
            "css" => format!(r#"<link rel="stylesheet" href="{}">"#, &caps[2]),
            _ => format!(r#"<script src="{}"></script>"#, &caps[2]),
        })
        .into_owned()
}

fn minify_config() -> minify_html::Cfg {
    minify_html::Cfg {
        minify_css: true,
        minify_js: true,
        ..minify_html::Cfg::default()
    }
}

pub struct HtmlTask;

#[async_trait]
impl TaskBody for HtmlTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let summary = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("html worker panicked")??;
        info!(written = summary.written, "pages minified");
        Ok(())
    }
}
