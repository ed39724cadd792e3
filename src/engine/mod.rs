// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler and its sequential-run primitive
//! - the dispatch queue (what happens when watch triggers arrive while a
//!   run is active)
//! - the main runtime event loop that reacts to:
//!   - dispatch requests (CLI invocation, file-watch bindings)
//!   - task completion events
//!   - shutdown signals
//! and signals live-reload clients once a watch dispatch has completed.

pub mod queue;
pub mod runtime;

pub use queue::{DispatchQueue, PendingDispatch};
pub use runtime::{
    DispatchSource, Runtime, RuntimeEvent, RuntimeOptions, SessionSummary, TaskName,
    TaskOutcome,
};
