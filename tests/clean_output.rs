use std::error::Error;
use std::fs;

use siteforge::pipeline::clean;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn clean_on_missing_directory_succeeds_and_leaves_it_absent() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let dist = tmp.path().join("dist");

    assert!(!dist.exists());
    clean::run_sync(&dist)?;
    assert!(!dist.exists());

    Ok(())
}

#[test]
fn clean_removes_everything_including_hidden_entries() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let dist = tmp.path().join("dist");

    fs::create_dir_all(dist.join("styles"))?;
    fs::create_dir_all(dist.join("images").join("posts"))?;
    fs::write(dist.join("index.html"), "<html></html>")?;
    fs::write(dist.join("styles").join("home.css"), "body{}")?;
    fs::write(dist.join(".hidden"), "stale")?;
    fs::write(dist.join("images").join(".DS_Store"), "junk")?;

    clean::run_sync(&dist)?;
    assert!(!dist.exists());

    // Running again over the now-missing tree is still a success.
    clean::run_sync(&dist)?;
    assert!(!dist.exists());

    Ok(())
}
