use std::error::Error;
use std::fs;

use siteforge::config::ConfigFile;
use siteforge::pipeline::{html, PipelineCtx};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn build_blocks_collapse_to_one_reference_and_pages_minify() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let cfg = ConfigFile::default();
    let ctx = PipelineCtx::new(tmp.path(), &cfg);

    fs::create_dir_all(&ctx.source)?;
    fs::write(
        ctx.source.join("index.html"),
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <!-- build:css styles/home.css -->\n\
         <link rel=\"stylesheet\" href=\"styles/a.css\">\n\
         <link rel=\"stylesheet\" href=\"styles/b.css\">\n\
         <!-- endbuild -->\n\
         <!-- a stray comment -->\n\
         </head>\n<body>\n  <p>hello</p>\n</body>\n</html>\n",
    )?;

    let summary = html::run_sync(&ctx)?;
    assert_eq!(summary.written, 1);

    let output = fs::read_to_string(ctx.dist.join("index.html"))?;

    // Single reference to the named output; intermediate references gone.
    assert!(output.contains("styles/home.css"), "output was: {output}");
    assert!(!output.contains("styles/a.css"));
    assert!(!output.contains("styles/b.css"));

    // Markers and comments do not survive minification.
    assert!(!output.contains("build:css"));
    assert!(!output.contains("endbuild"));
    assert!(!output.contains("stray comment"));

    assert!(output.contains("hello"));

    Ok(())
}

#[test]
fn script_build_blocks_resolve_to_script_tags() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let cfg = ConfigFile::default();
    let ctx = PipelineCtx::new(tmp.path(), &cfg);

    fs::create_dir_all(&ctx.source)?;
    fs::write(
        ctx.source.join("page.html"),
        "<html><body>\
         <!-- build:js scripts/app.js -->\
         <script src=\"scripts/one.js\"></script>\
         <script src=\"scripts/two.js\"></script>\
         <!-- endbuild -->\
         </body></html>",
    )?;

    html::run_sync(&ctx)?;
    let output = fs::read_to_string(ctx.dist.join("page.html"))?;

    assert!(output.contains("scripts/app.js"), "output was: {output}");
    assert!(!output.contains("scripts/one.js"));
    assert!(!output.contains("scripts/two.js"));

    Ok(())
}

#[test]
fn nested_pages_mirror_the_source_layout() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let cfg = ConfigFile::default();
    let ctx = PipelineCtx::new(tmp.path(), &cfg);

    let account = ctx.source.join("account");
    fs::create_dir_all(&account)?;
    fs::write(account.join("settings.html"), "<html><body>ok</body></html>")?;

    let summary = html::run_sync(&ctx)?;
    assert_eq!(summary.written, 1);
    assert!(ctx.dist.join("account").join("settings.html").is_file());

    Ok(())
}
