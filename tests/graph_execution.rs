use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use siteforge::dag::Scheduler;
use siteforge::engine::TaskOutcome;
use siteforge::pipeline::PipelineCtx;
use siteforge::registry::{TaskBody, TaskRegistry};

type TestResult = Result<(), Box<dyn Error>>;

struct Noop;

#[async_trait]
impl TaskBody for Noop {
    async fn run(&self, _ctx: &PipelineCtx) -> anyhow::Result<()> {
        Ok(())
    }
}

fn noop() -> Arc<dyn TaskBody> {
    Arc::new(Noop)
}

fn production_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.define("clean", [], noop());
    registry.define("styles", [], noop());
    registry.define("lint", [], noop());
    registry.define("html", [], noop());
    registry.define("scripts", [], noop());
    registry.define("images", [], noop());
    registry.define_sequence(
        "default",
        ["clean"],
        vec![
            vec!["styles".into()],
            vec![
                "lint".into(),
                "html".into(),
                "scripts".into(),
                "images".into(),
            ],
        ],
    );
    registry
}

fn names(ready: &[siteforge::dag::ScheduledTask]) -> Vec<&str> {
    let mut names: Vec<&str> = ready.iter().map(|t| t.name.as_str()).collect();
    names.sort();
    names
}

#[test]
fn production_build_orders_clean_styles_then_parallel_group() -> TestResult {
    let mut scheduler = Scheduler::from_registry(&production_registry());

    // The prerequisite runs first; nothing else is ready until it is done.
    let ready = scheduler.start_run(vec![vec!["default".into()]]);
    assert_eq!(names(&ready), vec!["clean"]);

    let ready = scheduler.handle_completion("clean", TaskOutcome::Success);
    assert_eq!(names(&ready), vec!["styles"]);

    // Once styles completes, the second stage is released as a group.
    let ready = scheduler.handle_completion("styles", TaskOutcome::Success);
    assert_eq!(names(&ready), vec!["html", "images", "lint", "scripts"]);

    for task in ["lint", "html", "scripts"] {
        let ready = scheduler.handle_completion(task, TaskOutcome::Success);
        assert!(ready.is_empty());
        assert!(!scheduler.is_idle());
    }

    let ready = scheduler.handle_completion("images", TaskOutcome::Success);
    assert!(ready.is_empty());
    assert!(scheduler.is_idle());
    assert!(!scheduler.last_run_failed());

    Ok(())
}

#[test]
fn shared_prerequisite_runs_at_most_once_per_run() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("common", [], noop());
    registry.define("a", ["common"], noop());
    registry.define("b", ["common"], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    // Both tasks in one unordered stage: the shared prerequisite is
    // scheduled exactly once.
    let ready = scheduler.start_run(vec![vec!["a".into(), "b".into()]]);
    assert_eq!(names(&ready), vec!["common"]);

    let ready = scheduler.handle_completion("common", TaskOutcome::Success);
    assert_eq!(names(&ready), vec!["a", "b"]);

    scheduler.handle_completion("a", TaskOutcome::Success);
    scheduler.handle_completion("b", TaskOutcome::Success);
    assert!(scheduler.is_idle());

    Ok(())
}

#[test]
fn shared_prerequisite_is_not_rerun_by_a_later_stage() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("common", [], noop());
    registry.define("a", ["common"], noop());
    registry.define("b", ["common"], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    let ready = scheduler.start_run(vec![vec!["a".into()], vec!["b".into()]]);
    assert_eq!(names(&ready), vec!["common"]);

    let ready = scheduler.handle_completion("common", TaskOutcome::Success);
    assert_eq!(names(&ready), vec!["a"]);

    // Entering the second dispatch stage must not schedule common again:
    // it already completed in this run.
    let ready = scheduler.handle_completion("a", TaskOutcome::Success);
    assert_eq!(names(&ready), vec!["b"]);

    scheduler.handle_completion("b", TaskOutcome::Success);
    assert!(scheduler.is_idle());

    Ok(())
}

#[test]
fn failed_prerequisite_blocks_dependents_and_fails_the_run() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("a", [], noop());
    registry.define("b", ["a"], noop());
    registry.define("c", ["b"], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    let ready = scheduler.start_run(vec![vec!["c".into()]]);
    assert_eq!(names(&ready), vec!["a"]);

    let ready = scheduler.handle_completion("a", TaskOutcome::Failed);
    assert!(ready.is_empty());
    assert!(scheduler.is_idle());
    assert!(scheduler.last_run_failed());

    Ok(())
}

#[test]
fn sibling_tasks_are_unaffected_by_a_failure() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("lint", [], noop());
    registry.define("scripts", [], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    let ready = scheduler.start_run(vec![vec!["lint".into(), "scripts".into()]]);
    assert_eq!(names(&ready), vec!["lint", "scripts"]);

    scheduler.handle_completion("lint", TaskOutcome::Failed);
    assert!(!scheduler.is_idle());

    // The sibling still completes normally; only the run outcome records
    // the failure.
    scheduler.handle_completion("scripts", TaskOutcome::Success);
    assert!(scheduler.is_idle());
    assert!(scheduler.last_run_failed());

    Ok(())
}
