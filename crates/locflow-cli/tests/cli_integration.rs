use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn locflow() -> Command {
    let mut cmd = Command::cargo_bin("locflow").expect("binary builds");
    // Keep output deterministic and never pick up a developer's real key.
    cmd.env("NO_COLOR", "1").env_remove("LOCFLOW_API_KEY");
    cmd
}

fn write_fixture(root: &Path) {
    fs::write(
        root.join("locflow.toml"),
        r#"
api_base = "https://api.example.test"
project_id = "proj_fixture"
source_locale = "en"
target_locales = ["de", "ja"]

[files]
include = ["content"]
output = "locales/{locale}/{name}"
"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("content")).unwrap();
    fs::write(
        root.join("content/home.json"),
        r#"{"title": "Welcome", "cta": "Get started"}"#,
    )
    .unwrap();
    fs::write(root.join("content/guide.mdx"), "# Guide\n\nHello.\n").unwrap();
}

#[test]
fn help_lists_subcommands() {
    locflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("push")
                .and(predicate::str::contains("pull"))
                .and(predicate::str::contains("scan"))
                .and(predicate::str::contains("status")),
        );
}

#[test]
fn init_writes_config_and_refuses_to_clobber() {
    let dir = tempfile::tempdir().unwrap();

    locflow()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("locflow.toml"));
    assert!(dir.path().join("locflow.toml").exists());

    locflow()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--overwrite"));

    locflow()
        .current_dir(dir.path())
        .args(["init", "--overwrite"])
        .assert()
        .success();
}

#[test]
fn scan_lists_discovered_files() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    locflow()
        .current_dir(dir.path())
        .arg("scan")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("content/home.json")
                .and(predicate::str::contains("content/guide.mdx"))
                .and(predicate::str::contains("2 file(s)")),
        );
}

#[test]
fn scan_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let output = locflow()
        .current_dir(dir.path())
        .args(["scan", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    let items = parsed.as_array().expect("array of scanned files");
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i["rel_path"] == "content/home.json"));
}

#[test]
fn push_dry_run_needs_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    locflow()
        .current_dir(dir.path())
        .args(["push", "--dry-run"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("would upload content/home.json")
                .and(predicate::str::contains("TOTAL: 2 file(s)")),
        );
}

#[test]
fn pull_dry_run_prints_the_per_locale_plan() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    locflow()
        .current_dir(dir.path())
        .args(["pull", "--dry-run"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("content/home.json [de]")
                .and(predicate::str::contains("content/home.json [ja]"))
                .and(predicate::str::contains("TOTAL: 4 file/locale pair(s)")),
        );
}

#[test]
fn pull_without_api_key_fails_with_a_pointer() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    locflow()
        .current_dir(dir.path())
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("LOCFLOW_API_KEY"));
}

#[test]
fn schema_dumps_result_types() {
    let dir = tempfile::tempdir().unwrap();

    locflow()
        .current_dir(dir.path())
        .args(["schema", "--out-dir", "schemas"])
        .assert()
        .success();
    let dumped = dir
        .path()
        .join("schemas")
        .join("batch_download_result.schema.json");
    let raw = fs::read_to_string(dumped).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(parsed["title"].is_string());
}
