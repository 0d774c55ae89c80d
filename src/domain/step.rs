//! Steps of the publishing recipe.

use super::CommitTemplate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What happens to the rest of the run when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Failure stops the run
    Required,
    /// Failure is recorded and the run continues
    Tolerated,
    /// Runs even after an earlier failure or an interrupt
    Always,
}

/// Identifier of a step, stable across runs and used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    VerifyClean,
    CheckoutPages,
    RemoveIndex,
    CleanTree,
    RestoreSources,
    BuildDocs,
    CopyOutput,
    RemoveSources,
    StageAll,
    Commit,
    Push,
    ReturnToOrigin,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::VerifyClean => "verify-clean",
            Self::CheckoutPages => "checkout-pages",
            Self::RemoveIndex => "remove-index",
            Self::CleanTree => "clean-tree",
            Self::RestoreSources => "restore-sources",
            Self::BuildDocs => "build-docs",
            Self::CopyOutput => "copy-output",
            Self::RemoveSources => "remove-sources",
            Self::StageAll => "stage-all",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::ReturnToOrigin => "return-to-origin",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// A single action of a publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Refuse to run with uncommitted changes
    VerifyClean,
    CheckoutPages {
        branch: String,
    },
    /// Drop the index so every file becomes untracked and gets cleaned
    RemoveIndex,
    CleanTree {
        include_ignored: bool,
        preserve: Vec<PathBuf>,
    },
    RestoreSources {
        from: String,
        paths: Vec<PathBuf>,
    },
    BuildDocs {
        program: String,
        args: Vec<String>,
        directory: PathBuf,
    },
    /// Copy the generated site into the repository root
    CopyOutput {
        from: PathBuf,
    },
    RemoveSources {
        paths: Vec<PathBuf>,
    },
    StageAll,
    Commit {
        template: CommitTemplate,
        allow_empty: bool,
    },
    Push {
        remote: String,
        branch: String,
    },
    ReturnToOrigin {
        branch: String,
    },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::VerifyClean => StepKind::VerifyClean,
            Self::CheckoutPages { .. } => StepKind::CheckoutPages,
            Self::RemoveIndex => StepKind::RemoveIndex,
            Self::CleanTree { .. } => StepKind::CleanTree,
            Self::RestoreSources { .. } => StepKind::RestoreSources,
            Self::BuildDocs { .. } => StepKind::BuildDocs,
            Self::CopyOutput { .. } => StepKind::CopyOutput,
            Self::RemoveSources { .. } => StepKind::RemoveSources,
            Self::StageAll => StepKind::StageAll,
            Self::Commit { .. } => StepKind::Commit,
            Self::Push { .. } => StepKind::Push,
            Self::ReturnToOrigin { .. } => StepKind::ReturnToOrigin,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        match self {
            Self::RemoveIndex => FailurePolicy::Tolerated,
            Self::ReturnToOrigin { .. } => FailurePolicy::Always,
            _ => FailurePolicy::Required,
        }
    }

    /// Shell equivalent of the step, shown in plans and reports
    pub fn command(&self) -> String {
        match self {
            Self::VerifyClean => "git status --porcelain".to_string(),
            Self::CheckoutPages { branch } => format!("git checkout {}", branch),
            Self::RemoveIndex => "rm .git/index || true".to_string(),
            Self::CleanTree {
                include_ignored,
                preserve,
            } => {
                let mut cmd = if *include_ignored {
                    "git clean -fdx".to_string()
                } else {
                    "git clean -fd".to_string()
                };
                for path in preserve {
                    cmd.push_str(&format!(" -e {}", path.display()));
                }
                cmd
            }
            Self::RestoreSources { from, paths } => {
                format!("git checkout {} -- {}", from, join_paths(paths))
            }
            Self::BuildDocs {
                program,
                args,
                directory,
            } => {
                let mut cmd = program.clone();
                for arg in args {
                    cmd.push(' ');
                    cmd.push_str(arg);
                }
                if directory.as_os_str().is_empty() {
                    cmd
                } else {
                    format!("(cd {} && {})", directory.display(), cmd)
                }
            }
            Self::CopyOutput { from } => format!("cp -r {}/* .", from.display()),
            Self::RemoveSources { paths } => format!("rm -rf {}", join_paths(paths)),
            Self::StageAll => "git add -A".to_string(),
            Self::Commit {
                template,
                allow_empty,
            } => commit_command(template.as_str(), *allow_empty),
            Self::Push { remote, branch } => format!("git push {} {}", remote, branch),
            Self::ReturnToOrigin { branch } => format!("git checkout {}", branch),
        }
    }
}

/// `git commit` line for a message, rendered or still a template
pub(crate) fn commit_command(message: &str, allow_empty: bool) -> String {
    if allow_empty {
        format!("git commit --allow-empty -m \"{}\"", message)
    } else {
        format!("git commit -m \"{}\"", message)
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First component of a relative path, e.g. `build` for `build/html`
pub(crate) fn top_level(path: &Path) -> Option<PathBuf> {
    path.components().find_map(|c| match c {
        std::path::Component::Normal(name) => Some(PathBuf::from(name)),
        _ => None,
    })
}
