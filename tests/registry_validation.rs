use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use siteforge::config::{validate::validate_config, ConfigFile};
use siteforge::pipeline::PipelineCtx;
use siteforge::registry::{validate_registry, TaskBody, TaskRegistry};

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

#[test]
fn default_config_is_valid() -> TestResult {
    validate_config(&ConfigFile::default())?;
    Ok(())
}

#[test]
fn colliding_server_ports_are_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.server.dist_port = cfg.server.dev_port;
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn style_entries_must_be_bare_names() {
    let mut cfg = ConfigFile::default();
    cfg.styles.entries = vec!["../outside".into()];
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn unknown_prerequisite_is_rejected() {
    let mut registry = TaskRegistry::new();
    registry.define("build", ["missing"], noop());
    assert!(validate_registry(&registry).is_err());
}

#[test]
fn prerequisite_cycle_is_rejected() {
    let mut registry = TaskRegistry::new();
    registry.define("a", ["b"], noop());
    registry.define("b", ["a"], noop());
    assert!(validate_registry(&registry).is_err());
}

#[test]
fn sequence_membership_cycle_is_rejected() {
    let mut registry = TaskRegistry::new();
    registry.define("step", ["all"], noop());
    registry.define_sequence("all", [], vec![vec!["step".into()]]);
    assert!(validate_registry(&registry).is_err());
}

#[test]
fn acyclic_registry_passes() -> TestResult {
    let mut registry = TaskRegistry::new();
    registry.define("clean", [], noop());
    registry.define("styles", [], noop());
    registry.define_sequence("default", ["clean"], vec![vec!["styles".into()]]);
    validate_registry(&registry)?;
    Ok(())
}
