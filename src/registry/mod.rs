// src/registry/mod.rs

//! Explicit task registry.
//!
//! The registry is the single table mapping task names to definitions,
//! built once at startup and passed by reference to the scheduler and the
//! executor. A definition carries:
//! - an ordered list of prerequisite task names,
//! - either a leaf body (a [`TaskBody`] run by the executor) or a
//!   *sequence*: stages run strictly one after another, where each stage is
//!   a set of task names with no relative order inside the stage,
//! - session flags (does running this task keep the process alive, does it
//!   open a watch session).

pub mod builtin;
pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::TaskName;
use crate::pipeline::PipelineCtx;

pub use builtin::builtin_registry;
pub use validate::validate_registry;

/// A leaf task body: one unit of build work.
///
/// Bodies receive the shared pipeline context and report completion through
/// their return value; the executor turns an `Err` into a failed outcome.
/// Blocking transform work is expected to hop onto the blocking pool.
#[async_trait]
pub trait TaskBody: Send + Sync {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()>;
}

/// One stage of a sequence: members run with no ordering guarantee among
/// themselves, but the stage as a whole completes before the next begins.
pub type Stage = Vec<TaskName>;

/// What a task does once its prerequisites are satisfied.
pub enum TaskKind {
    /// Run the body on the executor.
    Leaf(Arc<dyn TaskBody>),
    /// Run the stages in strict order; the task completes when the last
    /// stage does, and fails as soon as any stage member fails.
    Sequence(Vec<Stage>),
}

impl std::fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Leaf(_) => f.write_str("Leaf"),
            TaskKind::Sequence(stages) => f.debug_tuple("Sequence").field(stages).finish(),
        }
    }
}

/// A registered task.
#[derive(Debug)]
pub struct TaskDef {
    pub name: TaskName,
    /// Prerequisites: executed to completion before this task's own work
    /// begins. No relative order among them.
    pub prerequisites: Vec<TaskName>,
    pub kind: TaskKind,
    /// Running this task leaves a server (or similar) behind, so a one-shot
    /// invocation must not exit when the run goes idle.
    pub keep_alive: bool,
    /// Running this task opens a watch session: bindings dispatch re-runs
    /// for the lifetime of the process.
    pub watch_session: bool,
}

/// A watch binding: glob patterns (relative to the source root) mapped to an
/// ordered list of tasks, plus a reload flag. Raw form; compiled by
/// `watch::patterns` at session startup.
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub globs: Vec<String>,
    pub tasks: Vec<TaskName>,
    pub reload: bool,
}

/// Name → definition table. `BTreeMap` keeps listings stable.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskDef>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf task.
    pub fn define<N, P>(&mut self, name: N, prerequisites: P, body: Arc<dyn TaskBody>)
    where
        N: Into<TaskName>,
        P: IntoIterator<Item = N>,
    {
        self.insert(name, prerequisites, TaskKind::Leaf(body));
    }

    /// Register a sequence task: the sequential-run primitive. Stage N+1
    /// starts only after every member of stage N has completed.
    pub fn define_sequence<N, P>(&mut self, name: N, prerequisites: P, stages: Vec<Stage>)
    where
        N: Into<TaskName>,
        P: IntoIterator<Item = N>,
    {
        self.insert(name, prerequisites, TaskKind::Sequence(stages));
    }

    fn insert<N, P>(&mut self, name: N, prerequisites: P, kind: TaskKind)
    where
        N: Into<TaskName>,
        P: IntoIterator<Item = N>,
    {
        let name = name.into();
        let def = TaskDef {
            name: name.clone(),
            prerequisites: prerequisites.into_iter().map(Into::into).collect(),
            kind,
            keep_alive: false,
            watch_session: false,
        };
        self.tasks.insert(name, def);
    }

    /// Mark a task as keeping the process alive after its run completes.
    pub fn set_keep_alive(&mut self, name: &str) {
        if let Some(def) = self.tasks.get_mut(name) {
            def.keep_alive = true;
        }
    }

    /// Mark a task as opening a watch session.
    pub fn set_watch_session(&mut self, name: &str) {
        if let Some(def) = self.tasks.get_mut(name) {
            def.watch_session = true;
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &TaskDef)> {
        self.tasks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
