// src/pipeline/webp.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::pipeline::{relative_key, select_files, write_output, PipelineCtx, TransformSummary};
use crate::registry::TaskBody;

/// Re-encode post images to lossy WebP at the configured quality.
///
/// Outputs land beside the sources (`<source>/images/posts/*.webp`), so
/// pages can reference the `.webp` variant directly and a later `images`
/// run ships both.
pub fn run_sync(ctx: &PipelineCtx) -> Result<TransformSummary> {
    let posts_dir = ctx.source.join("images").join("posts");

    let mut summary = TransformSummary::default();

    for input in select_files(&posts_dir, "*")? {
        let already_webp = input
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("webp"));
        if already_webp {
            continue;
        }

        let key = relative_key(&ctx.source, &input);
        let img = image::open(&input).with_context(|| format!("decoding image {key}"))?;

        let encoder = webp::Encoder::from_image(&img)
            .map_err(|err| anyhow!("encoding {key} as webp: {err}"))?;
        let encoded = encoder.encode(ctx.images.webp_quality);

        write_output(&input.with_extension("webp"), &encoded)?;
        summary.written += 1;
    }

    Ok(summary)
}

pub struct WebpTask;

#[async_trait]
impl TaskBody for WebpTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let summary = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("webp worker panicked")??;
        info!(written = summary.written, "post images converted to webp");
        Ok(())
    }
}
