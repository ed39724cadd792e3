// src/pipeline/scripts.rs

use std::fs;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use minify_js::{minify, Session, TopLevelMode};
use tracing::info;

use crate::pipeline::{
    mirrored_output, relative_key, select_files, write_output, PipelineCtx, TransformSummary,
};
use crate::registry::TaskBody;

/// Minify every script under `<source>/scripts` into `<dist>/scripts`,
/// mirroring the directory layout.
pub fn run_sync(ctx: &PipelineCtx) -> Result<TransformSummary> {
    let scripts_dir = ctx.source.join("scripts");
    let session = Session::new();

    let mut summary = TransformSummary::default();

    for input in select_files(&scripts_dir, "**/*.js")? {
        let rel = relative_key(&ctx.source, &input);
        let data = fs::read(&input).with_context(|| format!("reading script {:?}", input))?;

        let mut out = Vec::new();
        minify(&session, TopLevelMode::Global, &data, &mut out)
            .map_err(|err| anyhow!("minifying {rel}: {err:?}"))?;

        let output = mirrored_output(&ctx.source, &ctx.dist, &input)?;
        write_output(&output, &out)?;
        summary.written += 1;
    }

    Ok(summary)
}

pub struct ScriptsTask;

#[async_trait]
impl TaskBody for ScriptsTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let summary = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("scripts worker panicked")??;
        info!(written = summary.written, "scripts minified");
        Ok(())
    }
}
