// src/watch/mod.rs

//! File watching and dispatch.
//!
//! This module is responsible for:
//! - Compiling watch-rule glob patterns per binding.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning filesystem change events into task dispatches: one dispatch
//!   of the binding's task list per reported change, plus the binding's
//!   reload flag.
//!
//! It does **not** know about task dependencies; ordering and reload
//! signalling happen in the runtime.

pub mod patterns;
pub mod watcher;

pub use patterns::{compile_watch_rules, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
