mod common;

use common::TestRepo;
use ghpages_publish::domain::{StepKind, StepOutcome};
use ghpages_publish::{PublishConfig, PublishReport, Publisher};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

fn publish(repo: &TestRepo, config: PublishConfig, no_push: bool) -> PublishReport {
    let publisher = Publisher::open(repo.root.clone(), config, false).expect("open repository");
    let plan = publisher.plan(no_push).expect("build plan");
    publisher.publish(&plan, &AtomicBool::new(false))
}

#[test]
fn publishes_generated_site_and_returns_to_master() {
    let repo = TestRepo::new();
    let hash = repo.short_hash("master");

    let report = publish(&repo, repo.config(), false);

    assert!(report.succeeded(), "{}", report.summary());
    assert_eq!(repo.current_branch(), "master");
    assert_eq!(repo.tree("gh-pages"), vec!["_static/site.css", "index.html"]);
    assert_eq!(
        repo.git(&["log", "-1", "--format=%s", "gh-pages"]),
        format!("Generated gh-pages for master@{}", hash)
    );
    assert_eq!(
        repo.git(&["show", "gh-pages:index.html"]),
        "<h1>Hello docs</h1>"
    );
    assert_eq!(repo.origin_rev("gh-pages"), repo.git(&["rev-parse", "gh-pages"]));

    // The master checkout is back to its committed state
    assert_eq!(repo.git(&["status", "--porcelain"]), "");
    assert!(repo.root.join("doc/source/index.txt").exists());
    assert!(!repo.root.join("index.html").exists());
}

#[test]
fn each_run_adds_a_commit_tagged_with_the_current_master() {
    let repo = TestRepo::new();
    assert_eq!(repo.commit_count("gh-pages"), 1);

    let first_hash = repo.short_hash("master");
    assert!(publish(&repo, repo.config(), false).succeeded());

    fs::write(repo.root.join("src/lib.py"), "VERSION = '1.1'\n").unwrap();
    repo.git(&["commit", "-q", "-am", "Bump version"]);
    let second_hash = repo.short_hash("master");
    assert_ne!(first_hash, second_hash);

    assert!(publish(&repo, repo.config(), false).succeeded());

    assert_eq!(repo.commit_count("gh-pages"), 3);
    let subjects = repo.git(&["log", "-2", "--format=%s", "gh-pages"]);
    let subjects: Vec<&str> = subjects.lines().collect();
    assert!(subjects[0].contains(&second_hash));
    assert!(subjects[1].contains(&first_hash));
}

#[test]
fn missing_pages_branch_fails_at_first_checkout() {
    let repo = TestRepo::without_pages();

    let report = publish(&repo, repo.config(), false);

    assert_ne!(report.exit_code, 0);
    assert_eq!(
        report.first_failure().map(|r| r.step),
        Some(StepKind::CheckoutPages)
    );
    assert!(report.outcome_of(StepKind::Commit).unwrap().is_skipped());
    assert_eq!(
        report.outcome_of(StepKind::ReturnToOrigin),
        Some(&StepOutcome::Succeeded)
    );
    assert_eq!(repo.current_branch(), "master");
    assert_eq!(repo.git(&["status", "--porcelain"]), "");
}

#[test]
fn failed_build_publishes_nothing() {
    let repo = TestRepo::new();
    let before = repo.git(&["rev-parse", "gh-pages"]);
    let mut config = repo.config();
    config.build.args = vec!["-c".to_string(), "echo 'build broke' >&2; exit 2".to_string()];

    let report = publish(&repo, config, false);

    assert_eq!(report.exit_code, 2);
    match report.outcome_of(StepKind::BuildDocs) {
        Some(StepOutcome::Failed { message, .. }) => assert_eq!(message, "build broke"),
        other => panic!("unexpected build outcome: {:?}", other),
    }
    assert!(report.outcome_of(StepKind::CopyOutput).unwrap().is_skipped());
    assert!(report.outcome_of(StepKind::Commit).unwrap().is_skipped());
    assert_eq!(repo.git(&["rev-parse", "gh-pages"]), before);
    assert_eq!(repo.origin_rev("gh-pages"), before);
    assert_eq!(repo.current_branch(), "master");
}

#[test]
fn preserved_files_survive_cleaning() {
    let repo = TestRepo::with_pages_files(&["CNAME", ".nojekyll"]);
    let mut config = repo.config();
    config.publish.preserve = vec![PathBuf::from("CNAME")];

    let report = publish(&repo, config, false);

    assert!(report.succeeded(), "{}", report.summary());
    assert_eq!(
        repo.tree("gh-pages"),
        vec!["CNAME", "_static/site.css", "index.html"]
    );
}

#[test]
fn no_push_keeps_origin_untouched() {
    let repo = TestRepo::new();
    let origin_before = repo.origin_rev("gh-pages");

    let report = publish(&repo, repo.config(), true);

    assert!(report.succeeded(), "{}", report.summary());
    assert!(report.outcome_of(StepKind::Push).is_none());
    assert_eq!(repo.origin_rev("gh-pages"), origin_before);
    assert_eq!(repo.commit_count("gh-pages"), 2);
}

#[test]
fn returns_to_the_branch_the_run_started_from() {
    let repo = TestRepo::new();
    repo.git(&["checkout", "-q", "-b", "docs-work"]);

    let report = publish(&repo, repo.config(), true);

    assert!(report.succeeded(), "{}", report.summary());
    assert_eq!(report.return_branch, "docs-work");
    assert_eq!(repo.current_branch(), "docs-work");
}
