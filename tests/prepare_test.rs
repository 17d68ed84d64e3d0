// tests/prepare_test.rs
use announce::config::{parse_config, PrepareConfig};
use announce::files::ReplacementOutcome;
use announce::pipeline::{run_prepare, PrepareOptions, SkipReason};
use announce::ui::Progress;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, ".gitignore", "# build output\ndist/\n*.log\n!keep.log\n");
    write(
        root,
        "package.json",
        r#"{"name": "widgets", "version": "2.0.0-beta.3", "dependencies": {"left-pad": "2.0.0-beta.3"}}"#,
    );
    write(root, "src/index.js", "export const VERSION = '2.0.0-beta.3';\n");
    write(root, "docs/guide.md", "Install 2.0.0-BETA.3 with npm\n");
    write(root, "dist/bundle.js", "2.0.0-beta.3");
    write(root, "debug.log", "2.0.0-beta.3");
    write(root, "keep.log", "2.0.0-beta.3");
    write(root, "vendor/lib.js", "2.0.0-beta.3");
    dir
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

#[test]
fn test_prepare_walks_the_ladder() {
    let dir = project();
    let config = parse_config(
        r#"
[prepare]
series = "next"
version_ladder = "alpha, beta, rc"
ignore_folders = ["vendor"]
"#,
    )
    .unwrap();
    let options = PrepareOptions::from_config(&config.prepare, dir.path().to_path_buf()).unwrap();

    let outcome = run_prepare(&options, &Progress::api()).unwrap();

    assert_eq!(outcome.current_version, "2.0.0-beta.3");
    assert_eq!(outcome.next_version.to_string(), "2.0.0-rc.1");

    let root = dir.path();
    let package = read(root, "package.json");
    assert!(package.contains(r#""version": "2.0.0-rc.1""#));
    assert!(package.contains(r#""left-pad": "2.0.0-beta.3""#));
    assert_eq!(read(root, "src/index.js"), "export const VERSION = '2.0.0-rc.1';\n");
    assert_eq!(read(root, "docs/guide.md"), "Install 2.0.0-rc.1 with npm\n");
    assert_eq!(read(root, "keep.log"), "2.0.0-rc.1");

    assert_eq!(read(root, "dist/bundle.js"), "2.0.0-beta.3");
    assert_eq!(read(root, "debug.log"), "2.0.0-beta.3");
    assert_eq!(read(root, "vendor/lib.js"), "2.0.0-beta.3");

    let report = outcome.replacement.ran().unwrap();
    assert_eq!(report.outcome(), ReplacementOutcome::Changed(4));
}

#[test]
fn test_prepare_twice_is_stable() {
    let dir = project();
    let options =
        PrepareOptions::from_config(&PrepareConfig::default(), dir.path().to_path_buf()).unwrap();

    let first = run_prepare(&options, &Progress::api()).unwrap();
    assert_eq!(first.next_version.to_string(), "2.0.0-beta.4");

    let second = run_prepare(&options, &Progress::api()).unwrap();
    assert_eq!(second.current_version, "2.0.0-beta.4");
    assert_eq!(second.next_version.to_string(), "2.0.0-beta.5");
    assert_eq!(read(dir.path(), "src/index.js"), "export const VERSION = '2.0.0-beta.5';\n");
}

#[test]
fn test_prepare_with_nothing_to_scan() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "*\n");
    let mut options =
        PrepareOptions::from_config(&PrepareConfig::default(), dir.path().to_path_buf()).unwrap();
    options.current_version = Some("0.9.0".to_string());

    let outcome = run_prepare(&options, &Progress::api()).unwrap();

    assert_eq!(outcome.next_version.to_string(), "0.9.1");
    assert_eq!(outcome.scanned, 0);
    assert_eq!(outcome.replacement.skip_reason(), Some(&SkipReason::NoTargetFiles));
}

#[test]
fn test_prepare_rejects_unknown_series() {
    let config = parse_config("[prepare]\nseries = \"sideways\"\n").unwrap();
    assert!(PrepareOptions::from_config(&config.prepare, ".".into()).is_err());
}
