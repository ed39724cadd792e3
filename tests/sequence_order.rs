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

fn sequence_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.define("a", [], noop());
    registry.define("b", [], noop());
    registry.define("c", [], noop());
    registry.define_sequence(
        "pipeline",
        [],
        vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
    );
    registry
}

#[test]
fn sequence_observes_full_completion_before_next_stage() -> TestResult {
    let mut scheduler = Scheduler::from_registry(&sequence_registry());

    let ready = scheduler.start_run(vec![vec!["pipeline".into()]]);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "a");

    // b must not appear until a has reported completion.
    let ready = scheduler.handle_completion("a", TaskOutcome::Success);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "b");

    let ready = scheduler.handle_completion("b", TaskOutcome::Success);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "c");

    let ready = scheduler.handle_completion("c", TaskOutcome::Success);
    assert!(ready.is_empty());
    assert!(scheduler.is_idle());
    assert!(!scheduler.last_run_failed());

    Ok(())
}

#[test]
fn sequence_failure_skips_remaining_stages() -> TestResult {
    let mut scheduler = Scheduler::from_registry(&sequence_registry());

    let ready = scheduler.start_run(vec![vec!["pipeline".into()]]);
    assert_eq!(ready[0].name, "a");

    scheduler.handle_completion("a", TaskOutcome::Success);
    let ready = scheduler.handle_completion("b", TaskOutcome::Failed);

    // c never runs; the sequence and the run are failed.
    assert!(ready.is_empty());
    assert!(scheduler.is_idle());
    assert!(scheduler.last_run_failed());

    Ok(())
}

#[test]
fn watch_dispatch_honours_listed_order() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("styles", [], noop());
    registry.define("scripts", [], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    // A dispatch of [styles, scripts] is a strict sequence of the two.
    let ready = scheduler.start_run(vec![vec!["styles".into()], vec!["scripts".into()]]);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "styles");

    let ready = scheduler.handle_completion("styles", TaskOutcome::Success);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "scripts");

    scheduler.handle_completion("scripts", TaskOutcome::Success);
    assert!(scheduler.is_idle());

    Ok(())
}

#[test]
fn nested_sequence_completes_its_owner() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("clean", [], noop());
    registry.define("build", [], noop());
    registry.define_sequence("all", ["clean"], vec![vec!["build".into()]]);
    registry.define("verify", ["all"], noop());
    let mut scheduler = Scheduler::from_registry(&registry);

    let ready = scheduler.start_run(vec![vec!["verify".into()]]);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "clean");

    let ready = scheduler.handle_completion("clean", TaskOutcome::Success);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "build");

    // Completing the last stage completes the sequence task, which in turn
    // unblocks its dependent.
    let ready = scheduler.handle_completion("build", TaskOutcome::Success);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "verify");

    scheduler.handle_completion("verify", TaskOutcome::Success);
    assert!(scheduler.is_idle());

    Ok(())
}
