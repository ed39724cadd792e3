// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::runtime::TaskName;

/// A dispatch that arrived while a run was already active: the ordered task
/// list to run next, and whether clients should be reloaded afterwards.
#[derive(Debug, Clone)]
pub struct PendingDispatch {
    pub tasks: Vec<TaskName>,
    pub reload: bool,
}

/// Queue of dispatches that arrive while a run is already executing.
///
/// Semantics:
/// - Each queued entry represents one future run.
/// - New triggers merge into the most recent entry (order preserved,
///   duplicates dropped), so a burst of file changes during a build
///   coalesces into a single follow-up run instead of a backlog.
/// - `max_batches` bounds how many future runs to remember; the oldest are
///   dropped beyond that.
#[derive(Debug)]
pub struct DispatchQueue {
    max_batches: usize,
    batches: VecDeque<PendingDispatch>,
}

impl DispatchQueue {
    /// Create a new queue. `max_batches` is clamped to at least 1, as a
    /// zero-length queue would make queuing semantics meaningless.
    pub fn new(max_batches: usize) -> Self {
        Self {
            max_batches: max_batches.max(1),
            batches: VecDeque::new(),
        }
    }

    /// Returns true if there are no queued dispatches.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Record a dispatch that arrived while a run is in progress.
    pub fn record(&mut self, dispatch: PendingDispatch) {
        match self.batches.back_mut() {
            Some(last) => {
                for task in dispatch.tasks {
                    if !last.tasks.contains(&task) {
                        debug!(task = %task, "merged trigger into queued dispatch");
                        last.tasks.push(task);
                    }
                }
                last.reload |= dispatch.reload;
            }
            None => {
                debug!(tasks = ?dispatch.tasks, "queued first pending dispatch");
                self.batches.push_back(dispatch);
            }
        }

        if self.batches.len() > self.max_batches {
            warn!(
                queued = self.batches.len(),
                max = self.max_batches,
                "exceeded queue length; dropping oldest pending dispatches"
            );
            while self.batches.len() > self.max_batches {
                self.batches.pop_front();
            }
        }
    }

    /// Take the next pending dispatch, if any.
    pub fn pop(&mut self) -> Option<PendingDispatch> {
        self.batches.pop_front()
    }
}
