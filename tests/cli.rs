mod common;

use assert_cmd::Command;
use common::{TestRepo, FAKE_BUILD};
use predicates::str::contains;
use serde_json::Value;
use std::fs;

fn cmd(repo: &TestRepo) -> Command {
    let mut cmd = Command::cargo_bin("ghpages-publish").unwrap();
    cmd.env("HOME", &repo.home)
        .env("XDG_CONFIG_HOME", repo.home.join(".config"))
        .env("XDG_DATA_HOME", repo.home.join(".local/share"))
        .env_remove("RUST_LOG")
        .arg("-C")
        .arg(&repo.root);
    cmd
}

/// Extra config file that swaps `make html` for the fake build
fn write_build_config(repo: &TestRepo) {
    let config = format!(
        "[build]\nprogram = \"sh\"\nargs = [\"-c\", \"{}\"]\n",
        FAKE_BUILD
    );
    fs::write(repo.home.join("publish.toml"), config).unwrap();
}

#[test]
fn dry_run_prints_plan_and_changes_nothing() {
    let repo = TestRepo::new();
    let before = repo.git(&["rev-parse", "gh-pages"]);

    cmd(&repo)
        .args(["gh-pages", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("git checkout gh-pages"))
        .stdout(contains("rm .git/index || true"))
        .stdout(contains("git push origin gh-pages"));

    assert_eq!(repo.git(&["rev-parse", "gh-pages"]), before);
    assert_eq!(repo.current_branch(), "master");
}

#[test]
fn plan_without_push_as_json() {
    let repo = TestRepo::new();

    let out = cmd(&repo)
        .args(["--json", "plan", "--no-push"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let steps: Value = serde_json::from_slice(&out).expect("valid json output");
    let kinds: Vec<&str> = steps
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["step"].as_str().unwrap())
        .collect();

    assert_eq!(kinds.first(), Some(&"checkout-pages"));
    assert_eq!(kinds.last(), Some(&"return-to-origin"));
    assert!(!kinds.contains(&"push"));
}

#[test]
fn config_honours_environment_overrides() {
    let repo = TestRepo::new();

    cmd(&repo)
        .env("GHPAGES_PUBLISH__BRANCHES__PAGES", "site")
        .arg("config")
        .assert()
        .success()
        .stdout(contains("\"pages\": \"site\""))
        .stdout(contains("\"source\": \"master\""));
}

#[test]
fn invalid_project_config_is_rejected() {
    let repo = TestRepo::new();
    fs::write(
        repo.root.join(".ghpages-publish.toml"),
        "[branches]\npages = \"master\"\n",
    )
    .unwrap();

    cmd(&repo)
        .args(["gh-pages", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("source and pages branch are both 'master'"));
}

#[test]
fn publish_reports_json_and_exit_code() {
    let repo = TestRepo::new();
    write_build_config(&repo);

    let out = cmd(&repo)
        .arg("--config")
        .arg(repo.home.join("publish.toml"))
        .args(["--json", "gh-pages"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&out).expect("valid json output");

    assert_eq!(report["exit_code"], 0);
    assert_eq!(report["source_commit"], repo.short_hash("master"));
    assert_eq!(repo.current_branch(), "master");
    assert_eq!(repo.commit_count("gh-pages"), 2);
    assert!(repo.home.join(".local/share/ghpages-publish/logs").is_dir());
}

#[test]
fn missing_pages_branch_exits_non_zero() {
    let repo = TestRepo::without_pages();
    write_build_config(&repo);

    cmd(&repo)
        .arg("--config")
        .arg(repo.home.join("publish.toml"))
        .arg("gh-pages")
        .assert()
        .code(1)
        .stdout(contains("✗ checkout-pages"))
        .stdout(contains("Failed with exit code 1"));

    assert_eq!(repo.current_branch(), "master");
}
