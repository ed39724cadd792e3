use std::error::Error;

use siteforge::registry::WatchRule;
use siteforge::watch::compile_watch_rules;

type TestResult = Result<(), Box<dyn Error>>;

fn dev_rules() -> Vec<WatchRule> {
    vec![
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
    ]
}

#[test]
fn styles_binding_matches_only_style_sources() -> TestResult {
    let bindings = compile_watch_rules(&dev_rules())?;
    let styles = &bindings[0];

    assert!(styles.matches("styles/home.scss"));
    assert!(styles.matches("styles/partials/_base.scss"));
    assert!(styles.matches("styles/legacy.css"));

    // A change outside the glob dispatches nothing for this binding.
    assert!(!styles.matches("scripts/app.js"));
    assert!(!styles.matches("images/logo.png"));
    assert!(!styles.matches("styles/readme.md"));

    assert_eq!(styles.tasks(), ["styles".to_string()]);
    assert!(styles.reload());

    Ok(())
}

#[test]
fn html_binding_matches_pages_at_any_depth() -> TestResult {
    let bindings = compile_watch_rules(&dev_rules())?;
    let html = &bindings[2];

    assert!(html.matches("index.html"));
    assert!(html.matches("account/settings.html"));
    assert!(!html.matches("styles/home.scss"));

    Ok(())
}

#[test]
fn invalid_glob_is_rejected_at_compile_time() {
    let rules = vec![WatchRule {
        globs: vec!["styles/[".into()],
        tasks: vec!["styles".into()],
        reload: false,
    }];
    assert!(compile_watch_rules(&rules).is_err());
}
