// src/serve/mod.rs

//! Static file server with optional live reload.
//!
//! One axum router per instance: every request falls through to a
//! `ServeDir` over the directory being served. In a dev session the
//! `tower-livereload` layer injects its client script and keeps the
//! long-poll connection that the runtime's `Reloader` handle pushes
//! refreshes into. Two instances can run at once on distinct ports (live
//! development against one, dist verification against the other).

pub mod server;

pub use server::{spawn_static_server, ServeTask, ServerHandle};
