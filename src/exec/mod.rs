// src/exec/mod.rs

//! Task body executor.
//!
//! Receives ready leaf tasks from the runtime, resolves their bodies
//! through the registry, runs each body on its own tokio task (so
//! independent tasks interleave freely), and reports completion back as
//! `TaskCompleted` events. A body error is logged and becomes a failed
//! outcome; it never takes the executor loop down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::scheduler::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::pipeline::PipelineCtx;
use crate::registry::{TaskKind, TaskRegistry};

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what the runtime uses as
/// `exec_tx`. Each scheduled task runs in its own tokio task, so multiple
/// tasks can be in flight at once.
pub fn spawn_executor(
    registry: Arc<TaskRegistry>,
    ctx: Arc<PipelineCtx>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");
        while let Some(task) = rx.recv().await {
            let registry = Arc::clone(&registry);
            let ctx = Arc::clone(&ctx);
            let runtime_tx = runtime_tx.clone();
            tokio::spawn(async move {
                run_task(task, registry, ctx, runtime_tx).await;
            });
        }
        info!("executor loop finished (channel closed)");
    });

    tx
}

/// Run a single task body and emit a `TaskCompleted` event.
async fn run_task(
    task: ScheduledTask,
    registry: Arc<TaskRegistry>,
    ctx: Arc<PipelineCtx>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let outcome = match registry.get(&task.name).map(|def| &def.kind) {
        Some(TaskKind::Leaf(body)) => {
            info!(task = %task.name, "starting task");
            match body.run(&ctx).await {
                Ok(()) => {
                    info!(task = %task.name, "task finished");
                    TaskOutcome::Success
                }
                Err(err) => {
                    error!(task = %task.name, "task error: {err:#}");
                    TaskOutcome::Failed
                }
            }
        }
        Some(TaskKind::Sequence(_)) => {
            // Sequences are stepped inside the scheduler and never reach
            // the executor.
            warn!(task = %task.name, "sequence task dispatched to executor; ignoring body");
            TaskOutcome::Success
        }
        None => {
            warn!(task = %task.name, "scheduled task missing from registry");
            TaskOutcome::Failed
        }
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
    {
        warn!(task = %task.name, error = %err, "failed to report task completion");
    }
}
