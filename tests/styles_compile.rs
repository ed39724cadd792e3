use std::error::Error;
use std::fs;

use siteforge::config::ConfigFile;
use siteforge::pipeline::{styles, PipelineCtx};

type TestResult = Result<(), Box<dyn Error>>;

fn ctx_with_entries(root: &std::path::Path, entries: &[&str]) -> PipelineCtx {
    let mut cfg = ConfigFile::default();
    cfg.styles.entries = entries.iter().map(|e| e.to_string()).collect();
    PipelineCtx::new(root, &cfg)
}

#[test]
fn entry_with_import_compiles_to_one_minified_prefixed_stylesheet() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ctx_with_entries(tmp.path(), &["home"]);

    let styles_dir = ctx.source.join("styles");
    fs::create_dir_all(&styles_dir)?;
    fs::write(styles_dir.join("_base.scss"), "$brand: #ff0000;\n")?;
    fs::write(
        styles_dir.join("home.scss"),
        "@import \"base\";\n\n.card {\n  display: flex;\n  color: $brand;\n}\n",
    )?;

    let summary = styles::run_sync(&ctx)?;
    assert_eq!(summary.written, 1);

    let output = fs::read_to_string(ctx.dist.join("styles").join("home.css"))?;

    // The variable from the imported partial was resolved and the color
    // minified.
    assert!(output.contains("color:red"), "output was: {output}");
    // Old-safari flexbox needs the -webkit- prefix.
    assert!(output.contains("-webkit-"), "output was: {output}");
    // Minified: no indentation or newline-separated declarations.
    assert!(!output.contains("\n  "), "output was: {output}");

    Ok(())
}

#[test]
fn missing_entry_sources_are_skipped() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ctx_with_entries(tmp.path(), &["home", "login"]);

    let styles_dir = ctx.source.join("styles");
    fs::create_dir_all(&styles_dir)?;
    fs::write(styles_dir.join("home.scss"), ".a { color: #00ff00; }\n")?;

    let summary = styles::run_sync(&ctx)?;
    assert_eq!(summary.written, 1);
    assert!(ctx.dist.join("styles").join("home.css").is_file());
    assert!(!ctx.dist.join("styles").join("login.css").exists());

    Ok(())
}

#[test]
fn malformed_stylesheet_fails_the_transform() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ctx_with_entries(tmp.path(), &["home"]);

    let styles_dir = ctx.source.join("styles");
    fs::create_dir_all(&styles_dir)?;
    fs::write(styles_dir.join("home.scss"), ".broken {\n  color: $missing;\n")?;

    assert!(styles::run_sync(&ctx).is_err());

    Ok(())
}
