// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::engine::{TaskName, TaskOutcome};
use crate::registry::{TaskKind, TaskRegistry};

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Task is part of this run but waiting on prerequisites.
    Pending,
    /// Leaf dispatched to the executor, or sequence currently stepping
    /// through its stages.
    Running,
    /// Task completed successfully in this run.
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed prerequisite).
    DoneFailed,
}

/// Static task information derived from the registry, plus per-run state.
#[derive(Debug, Clone)]
struct TaskState {
    name: TaskName,
    /// Direct prerequisites.
    deps: Vec<TaskName>,
    /// `Some` for sequence tasks: the stages to step through once the task
    /// starts. `None` for leaves.
    stages: Option<Vec<Vec<TaskName>>>,
    /// Per-run state (None if not participating in the current run).
    run_state: Option<RunState>,
}

/// Progress of one active sequence.
///
/// `owner == None` is the run's own dispatch order (the task list the run
/// was started with, stage by stage); otherwise the progress belongs to a
/// Running sequence task.
#[derive(Debug, Clone)]
struct SequenceProgress {
    owner: Option<TaskName>,
    stages: Vec<Vec<TaskName>>,
    idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageStatus {
    /// Members of the current stage are still pending or running.
    Waiting,
    /// Every member of the current stage completed successfully.
    Complete,
    /// At least one member of the current stage failed.
    Failed,
    /// No stages left (or the sequence was empty to begin with).
    Exhausted,
}

/// Description of a leaf task that the scheduler wants the executor to run
/// now. The executor resolves the body through the registry.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
}

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - pulling the full prerequisite closure of a triggered task into the run
/// - deduplicating, so a prerequisite shared by multiple tasks runs at most
///   once per run
/// - deciding when a task is ready (every prerequisite completed, including
///   asynchronous completion)
/// - stepping sequence tasks stage by stage, with a completion barrier
///   between stages
/// - failing dependents and aborting remaining stages when a task fails
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskState>,
    sequences: Vec<SequenceProgress>,

    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
    /// Whether any task participating in the current (or just-finished) run
    /// failed.
    run_failed: bool,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`TaskRegistry`].
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let graph = DagGraph::from_registry(registry);

        let mut tasks = HashMap::new();
        for (name, def) in registry.iter() {
            let stages = match &def.kind {
                TaskKind::Leaf(_) => None,
                TaskKind::Sequence(stages) => Some(stages.clone()),
            };
            tasks.insert(
                name.clone(),
                TaskState {
                    name: name.clone(),
                    deps: def.prerequisites.clone(),
                    stages,
                    run_state: None,
                },
            );
        }

        Self {
            graph,
            tasks,
            sequences: Vec::new(),
            run_counter: 0,
            current_run_id: None,
            run_failed: false,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Whether the most recent run had any failing task. Only meaningful
    /// once the run has finished.
    pub fn last_run_failed(&self) -> bool {
        self.run_failed
    }

    /// Start a new run from an ordered dispatch: each element of `stages`
    /// is a set of task names; sets run strictly one after another, tasks
    /// inside a set have no relative order.
    ///
    /// A plain `run(name)` is `start_run(vec![vec![name]])`; a watch
    /// dispatch of `[a, b]` is `start_run(vec![vec![a], vec![b]])` so the
    /// listed order is honoured.
    ///
    /// Returns the leaf tasks that are ready for the executor right away.
    pub fn start_run(&mut self, stages: Vec<Vec<TaskName>>) -> Vec<ScheduledTask> {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        self.run_failed = false;

        for state in self.tasks.values_mut() {
            state.run_state = None;
        }
        self.sequences.clear();

        debug!(run_id = self.run_counter, ?stages, "scheduler: starting new run");

        self.sequences.push(SequenceProgress {
            owner: None,
            stages,
            idx: 0,
        });
        self.enter_stage_members(0);

        self.settle()
    }

    /// Handle completion of a leaf task body with a concrete outcome.
    ///
    /// On success the task is marked `DoneSuccess` and anything newly
    /// unblocked (dependents, the next sequence stage) is scheduled. On
    /// failure the task is marked `DoneFailed`, its transitive dependents in
    /// this run are failed, and any sequence waiting on it aborts its
    /// remaining stages.
    pub fn handle_completion(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
    ) -> Vec<ScheduledTask> {
        if self.current_run_id.is_none() {
            warn!(task = %task, "handle_completion called with no active run; ignoring");
            return Vec::new();
        }

        match self.tasks.get_mut(task) {
            Some(state) => match outcome {
                TaskOutcome::Success => {
                    state.run_state = Some(RunState::DoneSuccess);
                    debug!(task = %task, "task completed successfully");
                }
                TaskOutcome::Failed => {
                    state.run_state = Some(RunState::DoneFailed);
                    self.run_failed = true;
                    warn!(task = %task, "task failed; failing dependents in this run");
                    self.mark_dependents_failed(task);
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return Vec::new();
            }
        }

        self.settle()
    }

    /// Returns all task names known to the scheduler.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Mark a task (and, transitively, its prerequisites) as part of the
    /// current run. Tasks that already have a per-run state are left alone:
    /// that is the per-run dedup rule.
    fn trigger(&mut self, task: &str) {
        let Some(state) = self.tasks.get_mut(task) else {
            warn!(task = %task, "trigger for unknown task; ignoring");
            return;
        };

        if state.run_state.is_some() {
            debug!(task = %task, "task already participating in this run");
            return;
        }

        state.run_state = Some(RunState::Pending);
        debug!(task = %task, "task marked as Pending in this run");

        let deps = state.deps.clone();
        for dep in deps {
            self.trigger(&dep);
        }
    }

    /// Trigger the members of the current stage of `self.sequences[idx]`.
    fn enter_stage_members(&mut self, idx: usize) {
        let members = match self.sequences.get(idx) {
            Some(seq) if seq.idx < seq.stages.len() => seq.stages[seq.idx].clone(),
            _ => return,
        };
        for member in members {
            self.trigger(&member);
        }
    }

    /// Drive the run to a fixpoint: start ready tasks, step sequences whose
    /// current stage has settled, and detect run completion. Returns the
    /// leaf tasks to hand to the executor.
    fn settle(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        loop {
            let mut changed = false;

            // Pending tasks whose prerequisites are all satisfied. Two
            // passes (decide, then mutate) to avoid borrowing conflicts.
            let candidates: Vec<TaskName> = self
                .tasks
                .values()
                .filter_map(|state| {
                    if matches!(state.run_state, Some(RunState::Pending))
                        && self.deps_satisfied(state)
                    {
                        Some(state.name.clone())
                    } else {
                        None
                    }
                })
                .collect();

            for name in candidates {
                let stages = match self.tasks.get_mut(&name) {
                    Some(state) => {
                        state.run_state = Some(RunState::Running);
                        state.stages.clone()
                    }
                    None => continue,
                };

                match stages {
                    None => {
                        debug!(task = %name, "prerequisites satisfied; dispatching leaf");
                        ready.push(ScheduledTask { name });
                    }
                    Some(stages) => {
                        debug!(task = %name, "prerequisites satisfied; starting sequence");
                        self.sequences.push(SequenceProgress {
                            owner: Some(name),
                            stages,
                            idx: 0,
                        });
                        let idx = self.sequences.len() - 1;
                        self.enter_stage_members(idx);
                    }
                }
                changed = true;
            }

            // Step sequences whose current stage has settled.
            let mut i = 0;
            while i < self.sequences.len() {
                match self.stage_status(&self.sequences[i]) {
                    StageStatus::Waiting => {
                        i += 1;
                    }
                    StageStatus::Complete => {
                        self.sequences[i].idx += 1;
                        if self.sequences[i].idx >= self.sequences[i].stages.len() {
                            let seq = self.sequences.remove(i);
                            self.finish_sequence(seq, true);
                        } else {
                            self.enter_stage_members(i);
                            i += 1;
                        }
                        changed = true;
                    }
                    StageStatus::Exhausted => {
                        let seq = self.sequences.remove(i);
                        self.finish_sequence(seq, true);
                        changed = true;
                    }
                    StageStatus::Failed => {
                        let seq = self.sequences.remove(i);
                        self.finish_sequence(seq, false);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        self.maybe_finish_run();
        ready
    }

    /// Record the terminal state of a sequence. Failure of a stage member
    /// aborts the remaining stages; stage members that are still running
    /// keep running (sibling isolation), only the sequence's own outcome is
    /// settled here.
    fn finish_sequence(&mut self, seq: SequenceProgress, success: bool) {
        match seq.owner {
            Some(owner) => {
                if success {
                    debug!(task = %owner, "sequence completed");
                    if let Some(state) = self.tasks.get_mut(&owner) {
                        state.run_state = Some(RunState::DoneSuccess);
                    }
                } else {
                    warn!(task = %owner, "sequence aborted; skipping remaining stages");
                    if let Some(state) = self.tasks.get_mut(&owner) {
                        state.run_state = Some(RunState::DoneFailed);
                    }
                    self.run_failed = true;
                    self.mark_dependents_failed(&owner);
                }
            }
            None => {
                if !success {
                    warn!("dispatch aborted; skipping remaining dispatch stages");
                    self.run_failed = true;
                }
            }
        }
    }

    /// Status of the current stage of a sequence.
    fn stage_status(&self, seq: &SequenceProgress) -> StageStatus {
        if seq.idx >= seq.stages.len() {
            return StageStatus::Exhausted;
        }

        let mut waiting = false;
        for member in &seq.stages[seq.idx] {
            match self.tasks.get(member).and_then(|s| s.run_state) {
                Some(RunState::DoneFailed) => return StageStatus::Failed,
                Some(RunState::Pending) | Some(RunState::Running) => waiting = true,
                Some(RunState::DoneSuccess) => {}
                // Unknown names were already warned about at trigger time.
                None => {}
            }
        }

        if waiting {
            StageStatus::Waiting
        } else {
            StageStatus::Complete
        }
    }

    /// Check whether all prerequisites of the given task completed
    /// successfully in the current run. Prerequisites are always pulled
    /// into the run alongside their dependents, so history plays no part.
    fn deps_satisfied(&self, state: &TaskState) -> bool {
        state.deps.iter().all(|dep| {
            matches!(
                self.tasks.get(dep).and_then(|d| d.run_state),
                Some(RunState::DoneSuccess)
            )
        })
    }

    /// Mark all triggered dependents (and their transitively triggered
    /// dependents) of a failed task as `DoneFailed` for this run, so
    /// nothing downstream of a failure ever starts.
    fn mark_dependents_failed(&mut self, failed_task: &str) {
        let mut stack: Vec<TaskName> = self
            .graph
            .dependents_of(failed_task)
            .iter()
            .cloned()
            .collect();

        while let Some(name) = stack.pop() {
            if let Some(state) = self.tasks.get_mut(&name) {
                match state.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        state.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %name,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {
                        // Either already terminal or not participating.
                    }
                }
            }
        }
    }

    /// Determine whether every participant is in a terminal state and clear
    /// `current_run_id` if so.
    fn maybe_finish_run(&mut self) {
        if self.current_run_id.is_none() {
            return;
        }

        let any_active = self.tasks.values().any(|state| {
            matches!(
                state.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        });

        if !any_active && self.sequences.is_empty() {
            info!(
                run_id = self.current_run_id,
                failed = self.run_failed,
                "scheduler: all tasks terminal; run finished"
            );
            self.current_run_id = None;
        }
    }
}
