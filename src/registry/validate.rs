// src/registry/validate.rs

use anyhow::{anyhow, Result};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::registry::{TaskKind, TaskRegistry};

/// Run semantic validation against a built task registry.
///
/// This checks:
/// - there is at least one task
/// - all prerequisite names refer to registered tasks, and no task lists
///   itself
/// - all sequence stage members refer to registered tasks, and no sequence
///   names itself in a stage
/// - the combined graph (prerequisite edges plus stage-membership edges) has
///   no cycles, so a run always terminates
pub fn validate_registry(registry: &TaskRegistry) -> Result<()> {
    ensure_has_tasks(registry)?;
    validate_references(registry)?;
    validate_dag(registry)?;
    Ok(())
}

fn ensure_has_tasks(registry: &TaskRegistry) -> Result<()> {
    if registry.is_empty() {
        return Err(anyhow!("task registry must contain at least one task"));
    }
    Ok(())
}

fn validate_references(registry: &TaskRegistry) -> Result<()> {
    for (name, def) in registry.iter() {
        for dep in &def.prerequisites {
            if !registry.contains(dep) {
                return Err(anyhow!(
                    "task '{}' has unknown prerequisite '{}'",
                    name,
                    dep
                ));
            }
            if dep == name {
                return Err(anyhow!("task '{}' cannot be its own prerequisite", name));
            }
        }

        if let TaskKind::Sequence(stages) = &def.kind {
            for stage in stages {
                for member in stage {
                    if !registry.contains(member) {
                        return Err(anyhow!(
                            "sequence '{}' names unknown task '{}'",
                            name,
                            member
                        ));
                    }
                    if member == name {
                        return Err(anyhow!(
                            "sequence '{}' cannot contain itself",
                            name
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_dag(registry: &TaskRegistry) -> Result<()> {
    // Edge direction: dependency -> dependent. A sequence depends on every
    // stage member the same way it depends on a prerequisite: the member
    // must reach completion before the sequence can.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in registry.names() {
        graph.add_node(name);
    }

    for (name, def) in registry.iter() {
        for dep in &def.prerequisites {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
        if let TaskKind::Sequence(stages) = &def.kind {
            for stage in stages {
                for member in stage {
                    graph.add_edge(member.as_str(), name.as_str(), ());
                }
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(anyhow!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        )),
    }
}
