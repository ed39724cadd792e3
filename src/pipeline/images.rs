// src/pipeline/images.rs

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ImagesSection;
use crate::pipeline::cache::{self, hash_bytes};
use crate::pipeline::{
    mirrored_output, relative_key, select_files, write_output, PipelineCtx, TransformSummary,
};
use crate::registry::TaskBody;

/// Recompress every image under `<source>/images` into `<dist>/images`.
///
/// - PNG: lossless recompression (oxipng preset from config).
/// - JPEG: near-lossless re-encode at the configured quality.
/// - GIF, WebP: copied byte-for-byte; re-encoding a GIF in-process would
///   drop animation frames, and the webp task owns WebP quality decisions.
///
/// With the content cache enabled, inputs whose bytes are unchanged since
/// the last run keep their existing output untouched.
pub fn run_sync(ctx: &PipelineCtx) -> Result<TransformSummary> {
    let images_dir = ctx.source.join("images");
    let mut cache = cache::maybe_load(ctx.images.cache, &ctx.cache_file)?;

    let mut summary = TransformSummary::default();

    for pattern in ["**/*.png", "**/*.gif", "**/*.jpg", "**/*.jpeg", "**/*.webp"] {
        for input in select_files(&images_dir, pattern)? {
            let key = relative_key(&ctx.source, &input);
            let output = mirrored_output(&ctx.source, &ctx.dist, &input)?;

            let data =
                fs::read(&input).with_context(|| format!("reading image {:?}", input))?;
            let digest = hash_bytes(&data);

            if let Some(cache) = &cache {
                if cache.is_fresh(&key, &digest) && output.is_file() {
                    debug!(image = %key, "unchanged; keeping cached output");
                    summary.skipped += 1;
                    continue;
                }
            }

            let bytes = recompress(&input, data, &ctx.images)
                .with_context(|| format!("optimizing image {key}"))?;
            write_output(&output, &bytes)?;

            if let Some(cache) = &mut cache {
                cache.record(key, digest);
            }
            summary.written += 1;
        }
    }

    if let Some(cache) = &cache {
        cache.persist()?;
    }

    Ok(summary)
}

fn recompress(input: &Path, data: Vec<u8>, cfg: &ImagesSection) -> Result<Vec<u8>> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => oxipng::optimize_from_memory(
            &data,
            &oxipng::Options::from_preset(cfg.png_level),
        )
        .map_err(|err| anyhow!("png recompression failed: {err}")),
        "jpg" | "jpeg" => reencode_jpeg(&data, cfg.jpeg_quality),
        // Copied through unchanged.
        _ => Ok(data),
    }
}

fn reencode_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data).context("decoding jpeg")?;

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut cursor,
        quality,
    );
    img.write_with_encoder(encoder).context("encoding jpeg")?;
    Ok(out)
}

pub struct ImagesTask;

#[async_trait]
impl TaskBody for ImagesTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let summary = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("images worker panicked")??;
        info!(
            written = summary.written,
            skipped = summary.skipped,
            "images optimized"
        );
        Ok(())
    }
}
