// src/pipeline/clean.rs

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::pipeline::PipelineCtx;
use crate::registry::TaskBody;

/// Remove the output tree so no stale artifact survives between builds.
///
/// Hidden entries go with the rest; a directory that does not exist is
/// already clean.
pub fn run_sync(dist: &Path) -> Result<()> {
    match fs::remove_dir_all(dist) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing output tree {:?}", dist)),
    }
}

pub struct CleanTask;

#[async_trait]
impl TaskBody for CleanTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let dist = ctx.dist.clone();
        tokio::task::spawn_blocking(move || run_sync(&dist)).await??;
        info!(dist = ?ctx.dist, "output tree removed");
        Ok(())
    }
}
