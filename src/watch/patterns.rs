// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::engine::TaskName;
use crate::registry::WatchRule;

/// Compiled glob patterns for one watch binding.
///
/// The patterns are relative to the watched root (the source tree); the
/// watcher passes relative paths (e.g. `"styles/home.scss"`) into
/// `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    tasks: Vec<TaskName>,
    reload: bool,
    glob_set: GlobSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("tasks", &self.tasks)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Tasks to dispatch, in the order listed in the rule.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// Whether a completed dispatch should refresh connected clients.
    pub fn reload(&self) -> bool {
        self.reload
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to the watched root), e.g. `"styles/home.scss"`.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob_set.is_match(rel_path)
    }
}

/// Compile raw watch rules into bindings.
pub fn compile_watch_rules(rules: &[WatchRule]) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::with_capacity(rules.len());

    for rule in rules {
        let mut builder = GlobSetBuilder::new();
        for pattern in &rule.globs {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid watch glob pattern: {pattern}"))?;
            builder.add(glob);
        }
        let glob_set = builder
            .build()
            .with_context(|| format!("building glob set for tasks {:?}", rule.tasks))?;

        bindings.push(WatchBinding {
            tasks: rule.tasks.clone(),
            reload: rule.reload,
            glob_set,
        });
    }

    Ok(bindings)
}
