// src/serve/server.rs

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{error, info};

use crate::pipeline::PipelineCtx;
use crate::registry::TaskBody;

/// Handle for a running static server. Dropping it does not stop the
/// server; the session ends with the process.
#[derive(Debug)]
pub struct ServerHandle {
    pub addr: SocketAddr,
    _join: tokio::task::JoinHandle<()>,
}

/// Bind a listener and serve `dir` on `port`.
///
/// Returns once the listener is bound, with the server itself running on
/// its own tokio task; the task that called this can complete while the
/// server outlives it.
pub async fn spawn_static_server(
    dir: impl Into<PathBuf>,
    port: u16,
    livereload: Option<LiveReloadLayer>,
) -> Result<ServerHandle> {
    let dir = dir.into();

    let mut app = Router::new().fallback_service(ServeDir::new(&dir));
    if let Some(layer) = livereload {
        app = app.layer(layer);
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding static server to {addr}"))?;
    let addr = listener.local_addr().context("reading bound address")?;

    info!(%addr, dir = ?dir, "static server listening");

    let join = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "static server stopped unexpectedly");
        }
    });

    Ok(ServerHandle { addr, _join: join })
}

/// Task body: serve the output tree. The task completes once the listener
/// is bound; the session keeps the process alive afterwards.
pub struct ServeTask {
    pub port: u16,
    /// Present in the dev session; the dist-verification server serves
    /// plain files.
    pub livereload: Option<LiveReloadLayer>,
}

#[async_trait]
impl TaskBody for ServeTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        // Dropping the handle detaches the server task; it runs for the
        // rest of the session.
        let _handle =
            spawn_static_server(ctx.dist.as_path(), self.port, self.livereload.clone()).await?;
        Ok(())
    }
}
