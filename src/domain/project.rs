//! Project entity representing the repository being published.

use crate::config::PublishConfig;
use std::path::{Path, PathBuf};

/// Repository root together with the configuration that drives a run
#[derive(Debug, Clone)]
pub struct Project {
    /// Repository root path
    pub root_path: PathBuf,
    /// Loaded configuration
    pub config: PublishConfig,
}

impl Project {
    /// Create a new Project from a root path and configuration
    pub fn new(root_path: PathBuf, config: PublishConfig) -> Self {
        Self { root_path, config }
    }

    /// Discover the repository root by walking up from a start directory
    pub fn discover(start_path: Option<PathBuf>) -> Option<PathBuf> {
        let start = start_path
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let mut current = start.as_path();
        loop {
            // Check for .git directory or file (worktree)
            let git_path = current.join(".git");
            if git_path.exists() {
                return Some(current.to_path_buf());
            }

            // Move up to parent
            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Resolve a repository-relative path
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root_path.join(relative)
    }
}
