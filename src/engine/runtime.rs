// src/engine/runtime.rs

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tower_livereload::Reloader;
use tracing::{debug, error, info, warn};

use crate::dag::scheduler::{ScheduledTask, Scheduler};
use crate::engine::queue::{DispatchQueue, PendingDispatch};

/// Public type alias for task names throughout the engine.
pub type TaskName = String;

/// Where a dispatch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSource {
    Cli,
    Watch,
}

/// Result of a task body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Events sent into the runtime from the CLI entry point, the watcher, and
/// the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Run the listed tasks as one run, in the listed order (strictly:
    /// task N+1 of the list starts only after task N completed). `reload`
    /// asks for a client refresh once the run finishes.
    Dispatch {
        tasks: Vec<TaskName>,
        source: DispatchSource,
        reload: bool,
    },
    /// A task body finished.
    TaskCompleted { task: TaskName, outcome: TaskOutcome },
    /// Ctrl-C (or equivalent) requested a shutdown.
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Default)]
pub struct RuntimeOptions {
    /// If true, exit as soon as there is nothing left to run and no queued
    /// dispatches. Watch and serve sessions set this to `false`.
    pub exit_when_idle: bool,
}

/// What a finished session reports back to `main` for the exit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSummary {
    /// Number of runs in which at least one task failed.
    pub failed_runs: u64,
}

impl SessionSummary {
    pub fn all_ok(&self) -> bool {
        self.failed_runs == 0
    }
}

/// The main orchestration runtime.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the CLI seed, watcher and executor.
/// - Serialize runs: dispatches arriving mid-run are queued and coalesced.
/// - Drive the DAG scheduler.
/// - Send ready leaf tasks to the executor.
/// - Signal live-reload clients after a reload-flagged run completes.
pub struct Runtime {
    scheduler: Scheduler,
    queue: DispatchQueue,
    options: RuntimeOptions,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Channel to the executor: ready leaf tasks go here.
    exec_tx: mpsc::Sender<ScheduledTask>,

    /// Live-reload handle; present in watch sessions.
    reloader: Option<Reloader>,

    /// Fired once, when the first run of the session completes. Used to
    /// defer watcher registration until the initial build is done.
    first_run_done: Option<oneshot::Sender<()>>,

    /// Reload flag of the currently active run.
    pending_reload: bool,

    /// True while a run started by this runtime has not been settled yet;
    /// keeps [`Self::on_run_finished`] to exactly one call per run.
    run_open: bool,

    summary: SessionSummary,
}

impl Runtime {
    pub fn new(
        scheduler: Scheduler,
        queue: DispatchQueue,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        exec_tx: mpsc::Sender<ScheduledTask>,
        reloader: Option<Reloader>,
        first_run_done: Option<oneshot::Sender<()>>,
    ) -> Self {
        Self {
            scheduler,
            queue,
            options,
            events_rx,
            exec_tx,
            reloader,
            first_run_done,
            pending_reload: false,
            run_open: false,
            summary: SessionSummary::default(),
        }
    }

    /// Main event loop. Runs until shutdown is requested, or (with
    /// `exit_when_idle`) until the scheduler goes idle with an empty queue.
    pub async fn run(mut self) -> Result<SessionSummary> {
        info!("runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            let keep_running = match event {
                RuntimeEvent::Dispatch {
                    tasks,
                    source,
                    reload,
                } => self.handle_dispatch(tasks, source, reload).await?,
                RuntimeEvent::TaskCompleted { task, outcome } => {
                    self.handle_task_completion(task, outcome).await?
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        info!(failed_runs = self.summary.failed_runs, "runtime exiting");
        Ok(self.summary)
    }

    /// Handle a dispatch request (from the CLI seed or a watch binding).
    async fn handle_dispatch(
        &mut self,
        tasks: Vec<TaskName>,
        source: DispatchSource,
        reload: bool,
    ) -> Result<bool> {
        info!(?tasks, ?source, "dispatch requested");

        if self.scheduler.is_idle() {
            self.begin_run(PendingDispatch { tasks, reload }).await?;
            return self.after_scheduler_step().await;
        }

        self.queue.record(PendingDispatch { tasks, reload });
        debug!("run in progress; dispatch queued");
        Ok(true)
    }

    /// Handle completion of a task body.
    async fn handle_task_completion(
        &mut self,
        task: TaskName,
        outcome: TaskOutcome,
    ) -> Result<bool> {
        match outcome {
            TaskOutcome::Success => info!(task = %task, "task completed successfully"),
            TaskOutcome::Failed => warn!(task = %task, "task failed"),
        }

        let newly_ready = self.scheduler.handle_completion(&task, outcome);
        self.dispatch_ready_tasks(newly_ready).await?;

        self.after_scheduler_step().await
    }

    /// Start a run from a dispatch: each listed task becomes one stage, so
    /// the listed order is a strict sequence. Finished-run handling is the
    /// caller's job via [`Self::after_scheduler_step`].
    async fn begin_run(&mut self, dispatch: PendingDispatch) -> Result<()> {
        self.pending_reload = dispatch.reload;
        self.run_open = true;

        let stages = dispatch
            .tasks
            .into_iter()
            .map(|task| vec![task])
            .collect::<Vec<_>>();

        let ready = self.scheduler.start_run(stages);
        self.dispatch_ready_tasks(ready).await
    }

    /// Post-step bookkeeping: while the scheduler is idle, settle the
    /// finished run, drain queued dispatches, and decide whether an
    /// idle-exiting session is over.
    async fn after_scheduler_step(&mut self) -> Result<bool> {
        while self.scheduler.is_idle() {
            if self.run_open {
                self.run_open = false;
                self.on_run_finished();
            }

            if let Some(next) = self.queue.pop() {
                self.begin_run(next).await?;
                continue;
            }

            if self.options.exit_when_idle {
                info!("runtime idle and exit_when_idle=true, stopping");
                return Ok(false);
            }
            break;
        }

        Ok(true)
    }

    /// One run just went idle: record its outcome, fire the first-run
    /// signal, and push a reload to connected clients if requested.
    fn on_run_finished(&mut self) {
        if self.scheduler.last_run_failed() {
            self.summary.failed_runs += 1;
        }

        if let Some(done) = self.first_run_done.take() {
            let _ = done.send(());
        }

        if self.pending_reload {
            self.pending_reload = false;
            match &self.reloader {
                Some(reloader) => {
                    info!("signalling live-reload clients");
                    reloader.reload();
                }
                None => debug!("reload requested but no reloader configured"),
            }
        }
    }

    /// Send all ready tasks to the executor.
    async fn dispatch_ready_tasks(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        for task in tasks {
            debug!(task = %task.name, "dispatching task to executor");
            if let Err(err) = self.exec_tx.send(task).await {
                error!(error = %err, "failed to send task to executor");
                // If the executor channel is closed, there's not much we can
                // do. Bubble up so higher layers can decide.
                return Err(err.into());
            }
        }
        Ok(())
    }
}
