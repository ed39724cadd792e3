use std::error::Error;
use std::fs;

use siteforge::config::ConfigFile;
use siteforge::pipeline::{lint, PipelineCtx};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn declared_names_and_globals_pass() -> TestResult {
    let source = "\
var greeting = 'hi';
function shout(message) {
    console.log(message + '!');
    return greeting;
}
shout(greeting);
";
    let findings = lint::check_source(source)?;
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    Ok(())
}

#[test]
fn undeclared_reference_is_reported_with_location() -> TestResult {
    let source = "function total(n) {\n    return n + mystery;\n}\n";
    let findings = lint::check_source(source)?;

    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.contains("mystery"));
    assert_eq!(findings[0].line, 2);

    Ok(())
}

#[test]
fn destructuring_defaults_and_imports_declare_their_bindings() -> TestResult {
    let source = "\
import fmt, { pad as padded } from './fmt.js';
const { width, height = 10 } = measure();
const dims = [width, height, padded, fmt];
function measure() { return { width: 1 }; }
";
    let findings = lint::check_source(source)?;
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    Ok(())
}

#[test]
fn lint_task_collects_findings_across_files() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let cfg = ConfigFile::default();
    let ctx = PipelineCtx::new(tmp.path(), &cfg);

    let js_dir = ctx.source.join("js");
    fs::create_dir_all(&js_dir)?;
    fs::write(js_dir.join("ok.js"), "var a = 1;\nconsole.log(a);\n")?;
    fs::write(js_dir.join("bad.js"), "console.log(ghost);\n")?;

    let findings = lint::run_sync(&ctx)?;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].file, "js/bad.js");
    assert!(findings[0].message.contains("ghost"));

    Ok(())
}

#[test]
fn empty_source_set_is_clean() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let cfg = ConfigFile::default();
    let ctx = PipelineCtx::new(tmp.path(), &cfg);

    // No js directory at all: the glob matches nothing, which is a valid
    // empty input.
    let findings = lint::run_sync(&ctx)?;
    assert!(findings.is_empty());

    Ok(())
}
