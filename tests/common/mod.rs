#![allow(dead_code)]

use ghpages_publish::PublishConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Shell snippet standing in for `make html`: turns doc/source into doc/build/html
pub const FAKE_BUILD: &str = "mkdir -p build/html/_static \
    && cp source/index.txt build/html/index.html \
    && echo 'body {}' > build/html/_static/site.css";

/// A working repository with a bare `origin` next to it
pub struct TestRepo {
    _temp: TempDir,
    pub root: PathBuf,
    pub origin: PathBuf,
    pub home: PathBuf,
}

/// Run git in `dir`, panicking with its stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

impl TestRepo {
    /// Repository with `master` holding doc/ and src/, and a `gh-pages` branch
    pub fn new() -> Self {
        Self::build(&[".nojekyll"])
    }

    /// Repository whose gh-pages branch starts out with the given files
    pub fn with_pages_files(files: &[&str]) -> Self {
        Self::build(files)
    }

    /// Repository with only `master`
    pub fn without_pages() -> Self {
        Self::setup()
    }

    fn setup() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let origin = temp.path().join("origin.git");
        let root = temp.path().join("work");
        let home = temp.path().join("home");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&home).unwrap();

        git(temp.path(), &["init", "--bare", "-q", "origin.git"]);
        git(&root, &["init", "-q", "-b", "master"]);
        git(&root, &["config", "user.email", "test@test.com"]);
        git(&root, &["config", "user.name", "Test"]);
        git(&root, &["config", "commit.gpgsign", "false"]);

        fs::create_dir_all(root.join("doc/source")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("README.md"), "# Project\n").unwrap();
        fs::write(root.join("doc/Makefile"), "html:\n\tsphinx-build -b html source build/html\n")
            .unwrap();
        fs::write(root.join("doc/source/index.txt"), "<h1>Hello docs</h1>\n").unwrap();
        fs::write(root.join("src/lib.py"), "VERSION = '1.0'\n").unwrap();

        git(&root, &["add", "."]);
        git(&root, &["commit", "-q", "-m", "Initial docs"]);
        git(&root, &["remote", "add", "origin", origin.to_str().unwrap()]);
        git(&root, &["push", "-q", "origin", "master"]);

        Self {
            _temp: temp,
            root,
            origin,
            home,
        }
    }

    fn build(pages_files: &[&str]) -> Self {
        let repo = Self::setup();
        let root = &repo.root;

        git(root, &["checkout", "-q", "--orphan", "gh-pages"]);
        git(root, &["rm", "-rf", "-q", "."]);
        for file in pages_files {
            fs::write(root.join(file), format!("{}\n", file)).unwrap();
        }
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", "Start gh-pages"]);
        git(root, &["push", "-q", "origin", "gh-pages"]);
        git(root, &["checkout", "-q", "master"]);

        repo
    }

    /// Configuration using the fake build and no run log
    pub fn config(&self) -> PublishConfig {
        let mut config = PublishConfig::default();
        config.build.program = "sh".to_string();
        config.build.args = vec!["-c".to_string(), FAKE_BUILD.to_string()];
        config.log.enabled = false;
        config
    }

    pub fn git(&self, args: &[&str]) -> String {
        git(&self.root, args)
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn commit_count(&self, rev: &str) -> usize {
        self.git(&["rev-list", "--count", rev]).parse().unwrap()
    }

    pub fn short_hash(&self, rev: &str) -> String {
        self.git(&["rev-parse", "--short", rev])
    }

    /// Files tracked on a branch, sorted
    pub fn tree(&self, rev: &str) -> Vec<String> {
        let mut files: Vec<String> = self
            .git(&["ls-tree", "-r", "--name-only", rev])
            .lines()
            .map(str::to_string)
            .collect();
        files.sort();
        files
    }

    pub fn origin_rev(&self, rev: &str) -> String {
        git(&self.origin, &["rev-parse", rev])
    }
}
