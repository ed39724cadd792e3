// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod serve;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tower_livereload::LiveReloadLayer;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::Scheduler;
use crate::engine::{
    DispatchQueue, DispatchSource, Runtime, RuntimeEvent, RuntimeOptions, SessionSummary,
};
use crate::pipeline::PipelineCtx;
use crate::registry::{builtin_registry, validate_registry, TaskKind, TaskRegistry, WatchRule};
use crate::watch::compile_watch_rules;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry and pipeline context
/// - scheduler / queue / runtime
/// - executor
/// - (in a dev session) the file watcher and live-reload handle
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<SessionSummary> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let root_dir = config_root_dir(&config_path);
    let ctx = Arc::new(PipelineCtx::new(root_dir, &cfg));

    // The layer goes into the serve task; the runtime keeps the matching
    // reload handle.
    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let (registry, watch_rules) = builtin_registry(&cfg, livereload);
    validate_registry(&registry)?;

    if args.list {
        print_task_list(&registry, &watch_rules);
        return Ok(SessionSummary::default());
    }

    let task = args.task.clone().unwrap_or_else(|| "default".to_string());
    let def = registry.get(&task).ok_or_else(|| {
        anyhow!(
            "unknown task '{}' (available: {})",
            task,
            registry.names().collect::<Vec<_>>().join(", ")
        )
    })?;
    let watch_session = def.watch_session;
    let keep_alive = def.keep_alive;

    let scheduler = Scheduler::from_registry(&registry);
    let queue = DispatchQueue::new(cfg.watch.queue_length);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Task body executor.
    let exec_tx = exec::spawn_executor(Arc::new(registry), Arc::clone(&ctx), rt_tx.clone());

    // File watcher: dev sessions only. Registration is deferred until the
    // initial build completes unless configured otherwise.
    let mut first_run_done = None;
    let mut _watcher_handle = None;
    if watch_session {
        let bindings = compile_watch_rules(&watch_rules)?;
        let watch_root = ctx.source.clone();
        let tx = rt_tx.clone();

        if cfg.watch.defer_until_built {
            let (ready_tx, ready_rx) = oneshot::channel::<()>();
            first_run_done = Some(ready_tx);
            tokio::spawn(async move {
                if ready_rx.await.is_err() {
                    return;
                }
                match watch::spawn_watcher(watch_root, bindings, tx) {
                    // Park forever; dropping the handle would stop watching.
                    Ok(_handle) => std::future::pending::<()>().await,
                    Err(err) => error!(error = %err, "failed to start file watcher"),
                }
            });
        } else {
            _watcher_handle = Some(watch::spawn_watcher(watch_root, bindings, tx)?);
        }
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Seed the invoked task.
    info!(task = %task, "initial dispatch");
    rt_tx
        .send(RuntimeEvent::Dispatch {
            tasks: vec![task],
            source: DispatchSource::Cli,
            reload: false,
        })
        .await?;

    let options = RuntimeOptions {
        exit_when_idle: !watch_session && !keep_alive,
    };

    let runtime = Runtime::new(
        scheduler,
        queue,
        options,
        rt_rx,
        exec_tx,
        watch_session.then_some(reloader),
        first_run_done,
    );
    runtime.run().await
}

/// Figure out the project root: directory containing the config file, or
/// `.` when the path has no parent.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `--list` output: tasks, prerequisites, stages and watch bindings.
fn print_task_list(registry: &TaskRegistry, rules: &[WatchRule]) {
    println!("tasks ({}):", registry.len());
    for (name, def) in registry.iter() {
        println!("  - {name}");
        if !def.prerequisites.is_empty() {
            println!("      after: {:?}", def.prerequisites);
        }
        match &def.kind {
            TaskKind::Leaf(_) => {}
            TaskKind::Sequence(stages) => {
                println!("      sequence: {:?}", stages);
            }
        }
        if def.keep_alive {
            println!("      keeps the process alive");
        }
        if def.watch_session {
            println!("      opens a watch session");
        }
    }

    if !rules.is_empty() {
        println!();
        println!("watch bindings (dev session):");
        for rule in rules {
            println!(
                "  - {:?} -> {:?}{}",
                rule.globs,
                rule.tasks,
                if rule.reload { " + reload" } else { "" }
            );
        }
    }
}
