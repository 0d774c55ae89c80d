//! Git service for the repository being published.
//!
//! Shells out to the git CLI through a [`CommandRunner`].

use super::process::{CommandRunner, Invocation};
use crate::domain::WorktreeStatus;
use crate::error::{GitError, GitResult};
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

fn short_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{4,40}$").unwrap())
}

/// Git service for branch switching, cleaning and publishing
#[derive(Clone)]
pub struct GitService {
    repo_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl GitService {
    /// Open a repository, verifying that git recognises it
    pub fn open(repo_path: PathBuf, runner: Arc<dyn CommandRunner>) -> GitResult<Self> {
        let service = Self { repo_path, runner };
        match service.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(out) if out == "true" => Ok(service),
            Ok(_) | Err(GitError::Command { .. }) => {
                Err(GitError::NotARepository(service.repo_path.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Run git with arguments, returning trimmed stdout on success
    fn git(&self, args: &[&str]) -> GitResult<String> {
        self.git_owned(args.iter().map(|s| s.to_string()).collect())
            .map(|out| out.trim().to_string())
    }

    /// Run git with owned arguments, returning stdout untouched on success
    fn git_owned(&self, args: Vec<String>) -> GitResult<String> {
        let invocation = Invocation {
            program: "git".to_string(),
            args,
            cwd: self.repo_path.clone(),
            echo: false,
        };
        let output = self.runner.run(&invocation)?;

        if !output.success() {
            return Err(GitError::Command {
                command: invocation.display(),
                exit_code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Get the checked-out branch, `None` when HEAD is detached
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(branch))
        }
    }

    /// Absolute path of the git directory (a worktree's `.git` may be a file)
    pub fn git_dir(&self) -> GitResult<PathBuf> {
        let dir = PathBuf::from(self.git(&["rev-parse", "--git-dir"])?);
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(self.repo_path.join(dir))
        }
    }

    /// Get the status of the working tree
    pub fn status(&self) -> GitResult<WorktreeStatus> {
        // Leading spaces are part of the porcelain status columns
        let output = self.git_owned(vec!["status".to_string(), "--porcelain".to_string()])?;
        Ok(WorktreeStatus::from_porcelain(&output))
    }

    pub fn checkout(&self, branch: &str) -> GitResult<()> {
        self.git(&["checkout", branch]).map(|_| ())
    }

    /// Check out paths from another branch into the working tree and index
    pub fn restore_paths(&self, from: &str, paths: &[PathBuf]) -> GitResult<()> {
        let mut args = vec!["checkout".to_string(), from.to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        self.git_owned(args).map(|_| ())
    }

    /// Remove untracked files and directories, keeping `preserve`
    pub fn clean(&self, include_ignored: bool, preserve: &[PathBuf]) -> GitResult<()> {
        let flags = if include_ignored { "-fdx" } else { "-fd" };
        let mut args = vec!["clean".to_string(), flags.to_string()];
        for path in preserve {
            args.push("-e".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        self.git_owned(args).map(|_| ())
    }

    pub fn stage_all(&self) -> GitResult<()> {
        self.git(&["add", "-A"]).map(|_| ())
    }

    pub fn commit(&self, message: &str, allow_empty: bool) -> GitResult<()> {
        let mut args = vec!["commit"];
        if allow_empty {
            args.push("--allow-empty");
        }
        args.extend(["-m", message]);
        self.git(&args).map(|_| ())
    }

    pub fn push(&self, remote: &str, branch: &str) -> GitResult<()> {
        self.git(&["push", remote, branch]).map(|_| ())
    }

    /// Abbreviated hash of a revision
    pub fn short_hash(&self, rev: &str) -> GitResult<String> {
        let hash = self.git(&["rev-parse", "--short", rev])?;
        if !short_hash_pattern().is_match(&hash) {
            return Err(GitError::UnexpectedOutput {
                command: format!("git rev-parse --short {}", rev),
                output: hash,
            });
        }
        Ok(hash)
    }

    /// Subject line of a revision's commit message
    pub fn subject(&self, rev: &str) -> GitResult<String> {
        self.git(&["log", "-1", "--format=%s", rev])
    }
}
