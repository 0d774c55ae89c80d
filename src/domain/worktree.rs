//! Working tree status.

use serde::{Deserialize, Serialize};

/// Working tree status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorktreeStatus {
    /// No uncommitted changes
    Clean,
    /// Has uncommitted changes
    Dirty {
        modified: u32,
        staged: u32,
        untracked: u32,
    },
}

impl WorktreeStatus {
    /// Parse the output of `git status --porcelain`
    pub fn from_porcelain(output: &str) -> Self {
        if output.trim().is_empty() {
            return Self::Clean;
        }

        let mut modified = 0u32;
        let mut staged = 0u32;
        let mut untracked = 0u32;

        for line in output.lines() {
            if line.len() >= 2 {
                let index = line.chars().next().unwrap_or(' ');
                let worktree = line.chars().nth(1).unwrap_or(' ');

                match (index, worktree) {
                    ('?', '?') => untracked += 1,
                    (i, w) if i != ' ' && w != ' ' => {
                        staged += 1;
                        modified += 1;
                    }
                    (i, _) if i != ' ' && i != '?' => staged += 1,
                    (_, w) if w != ' ' && w != '?' => modified += 1,
                    _ => {}
                }
            }
        }

        Self::Dirty {
            modified,
            staged,
            untracked,
        }
    }

    /// Check if the worktree is clean
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Check if the worktree is dirty
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty { .. })
    }

    /// Get status description
    pub fn description(&self) -> String {
        match self {
            Self::Clean => "Clean".to_string(),
            Self::Dirty {
                modified,
                staged,
                untracked,
            } => {
                let mut parts = Vec::new();
                if *modified > 0 {
                    parts.push(format!("{}M", modified));
                }
                if *staged > 0 {
                    parts.push(format!("{}S", staged));
                }
                if *untracked > 0 {
                    parts.push(format!("{}?", untracked));
                }
                parts.join(" ")
            }
        }
    }
}

impl std::fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
