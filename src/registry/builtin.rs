// src/registry/builtin.rs

//! The built-in task table.
//!
//! This is the one place that knows which tasks exist, how they depend on
//! each other, and which watch bindings a dev session installs. Everything
//! else (scheduler, executor, watcher) works off the structures built here.

use std::sync::Arc;

use tower_livereload::LiveReloadLayer;

use crate::config::ConfigFile;
use crate::pipeline::{
    clean::CleanTask, html::HtmlTask, images::ImagesTask, lint::LintTask,
    scripts::ScriptsTask, styles::StylesTask, webp::WebpTask,
};
use crate::registry::{TaskRegistry, WatchRule};
use crate::serve::ServeTask;

/// Build the registry of named tasks plus the dev-session watch rules.
///
/// Task graph:
/// - `default`: after `clean`, run `styles`, then `lint` + `html` +
///   `scripts` + `images` with no relative order.
/// - `dev`: after `clean`, run `images` → `styles` → `html` → `serve` in
///   strict order, then watch.
/// - `serve:dist`: full production build, then a second server on the dist
///   port without live reload.
///
/// The `livereload` layer is created by the caller so the runtime can hold
/// the matching [`tower_livereload::Reloader`] and signal clients after a
/// watch dispatch completes.
pub fn builtin_registry(
    cfg: &ConfigFile,
    livereload: LiveReloadLayer,
) -> (TaskRegistry, Vec<WatchRule>) {
    let mut registry = TaskRegistry::new();

    registry.define("clean", [], Arc::new(CleanTask));
    registry.define("styles", [], Arc::new(StylesTask));
    registry.define("scripts", [], Arc::new(ScriptsTask));
    registry.define("lint", [], Arc::new(LintTask));
    registry.define("images", [], Arc::new(ImagesTask));
    registry.define("webp", [], Arc::new(WebpTask));
    registry.define("html", [], Arc::new(HtmlTask));

    registry.define(
        "serve",
        [],
        Arc::new(ServeTask {
            port: cfg.server.dev_port,
            livereload: Some(livereload),
        }),
    );
    registry.set_keep_alive("serve");

    registry.define(
        "serve:dist",
        ["default"],
        Arc::new(ServeTask {
            port: cfg.server.dist_port,
            livereload: None,
        }),
    );
    registry.set_keep_alive("serve:dist");

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

    registry.define_sequence(
        "dev",
        ["clean"],
        vec![
            vec!["images".into()],
            vec!["styles".into()],
            vec!["html".into()],
            vec!["serve".into()],
        ],
    );
    registry.set_keep_alive("dev");
    registry.set_watch_session("dev");

    let rules = vec![
        WatchRule {
            globs: vec!["styles/**/*.scss".into(), "styles/**/*.css".into()],
            tasks: vec!["styles".into()],
            reload: true,
        },
        WatchRule {
            globs: vec!["images/**/*".into()],
            tasks: vec!["images".into()],
            reload: true,
        },
        WatchRule {
            globs: vec!["**/*.html".into()],
            tasks: vec!["html".into()],
            reload: true,
        },
    ];

    (registry, rules)
}
