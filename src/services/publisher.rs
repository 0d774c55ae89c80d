//! Executes a publish plan step by step and records what happened.

use super::git::GitService;
use super::process::{CommandRunner, Invocation, RunLog, SystemRunner};
use super::site;
use crate::config::{PublishConfig, ReturnTo};
use crate::domain::{
    CommitContext, FailurePolicy, PlanOptions, Project, PublishPlan, PublishReport, Step,
    StepOutcome, StepRecord,
};
use crate::error::{GitError, ProcessError, Result, SiteError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Exit code used when the build program cannot be started at all
const SPAWN_FAILED_EXIT_CODE: i32 = 127;

/// Why a step failed, in the shape recorded in the report
#[derive(Debug)]
struct StepFailure {
    exit_code: i32,
    message: String,
}

impl StepFailure {
    fn new(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }
}

impl From<GitError> for StepFailure {
    fn from(err: GitError) -> Self {
        Self::new(err.exit_code().unwrap_or(1), err.to_string())
    }
}

impl From<SiteError> for StepFailure {
    fn from(err: SiteError) -> Self {
        Self::new(1, err.to_string())
    }
}

impl From<ProcessError> for StepFailure {
    fn from(err: ProcessError) -> Self {
        let code = match err {
            ProcessError::Spawn { .. } => SPAWN_FAILED_EXIT_CODE,
            _ => 1,
        };
        Self::new(code, err.to_string())
    }
}

/// Drives one publish run against a repository
pub struct Publisher {
    project: Project,
    git: GitService,
    runner: Arc<dyn CommandRunner>,
}

impl Publisher {
    pub fn new(project: Project, git: GitService, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            project,
            git,
            runner,
        }
    }

    /// Open the repository at `root` using the system git.
    ///
    /// With `with_log` set, command output is also written to a per-run log
    /// file when the configuration enables one.
    pub fn open(root: PathBuf, config: PublishConfig, with_log: bool) -> Result<Self> {
        let log = match config.log_directory() {
            Some(dir) if with_log => Some(RunLog::create(&dir, &root, &config.branches.pages)?),
            _ => None,
        };
        if let Some(log) = &log {
            tracing::info!("Writing run log to {:?}", log.path());
        }

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(log));
        let git = GitService::open(root.clone(), runner.clone())?;
        Ok(Self::new(Project::new(root, config), git, runner))
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Build the plan, resolving which branch to come back to
    pub fn plan(&self, no_push: bool) -> Result<PublishPlan> {
        let config = &self.project.config;
        let return_branch = match config.publish.return_to {
            ReturnTo::Source => config.branches.source.clone(),
            ReturnTo::Origin => match self.git.current_branch()? {
                Some(branch) => branch,
                None => {
                    tracing::warn!(
                        "HEAD is detached, will return to {} afterwards",
                        config.branches.source
                    );
                    config.branches.source.clone()
                }
            },
        };

        let options = PlanOptions {
            return_branch,
            push: config.publish.push && !no_push,
        };
        Ok(PublishPlan::build(config, &options)?)
    }

    /// Execute every step of `plan`.
    ///
    /// Required steps stop the run on failure, tolerated ones do not, and the
    /// final branch switch always runs. `cancel` is checked between steps.
    pub fn publish(&self, plan: &PublishPlan, cancel: &AtomicBool) -> PublishReport {
        let branches = &self.project.config.branches;
        let return_branch = plan.return_branch().unwrap_or(&branches.source);
        let mut report = PublishReport::new(&branches.source, &branches.pages, return_branch);

        match self.git.short_hash(&branches.source) {
            Ok(hash) => report.source_commit = Some(hash),
            Err(e) => tracing::warn!("Could not resolve {}: {}", branches.source, e),
        }

        let total = plan.steps().len();
        let mut halted: Option<String> = None;

        for (index, step) in plan.steps().iter().enumerate() {
            let policy = step.policy();

            if policy != FailurePolicy::Always {
                if halted.is_none() && cancel.load(Ordering::SeqCst) {
                    tracing::warn!("Interrupted, skipping remaining steps");
                    report.interrupted = true;
                    halted = Some("interrupted".to_string());
                }
                if let Some(reason) = &halted {
                    tracing::debug!("Skipping {}: {}", step.kind(), reason);
                    report.record(StepRecord::new(
                        step,
                        StepOutcome::Skipped {
                            reason: reason.clone(),
                        },
                        Default::default(),
                    ));
                    continue;
                }
            }

            tracing::info!("[{}/{}] {}", index + 1, total, step.command());
            let started = Instant::now();

            let outcome = match self.execute(step, &mut report) {
                Ok(()) => StepOutcome::Succeeded,
                Err(failure) if policy == FailurePolicy::Tolerated => {
                    tracing::warn!("{} failed, continuing: {}", step.kind(), failure.message);
                    StepOutcome::Tolerated {
                        message: failure.message,
                    }
                }
                Err(failure) => {
                    tracing::error!(
                        "{} failed (exit {}): {}",
                        step.kind(),
                        failure.exit_code,
                        failure.message
                    );
                    if policy != FailurePolicy::Always && halted.is_none() {
                        halted = Some(format!("{} failed", step.kind()));
                    }
                    StepOutcome::Failed {
                        exit_code: failure.exit_code,
                        message: failure.message,
                    }
                }
            };

            let record = match (step, &report.commit_message) {
                (Step::Commit { .. }, Some(message)) => {
                    StepRecord::commit(step, message, outcome, started.elapsed())
                }
                _ => StepRecord::new(step, outcome, started.elapsed()),
            };
            report.record(record);
        }

        // A child killed by Ctrl+C can fail before the handler sets the flag
        if halted.is_some() && cancel.load(Ordering::SeqCst) {
            report.interrupted = true;
        }
        report.finish();
        report
    }

    fn execute(
        &self,
        step: &Step,
        report: &mut PublishReport,
    ) -> std::result::Result<(), StepFailure> {
        match step {
            Step::VerifyClean => {
                let status = self.git.status()?;
                if status.is_dirty() {
                    return Err(StepFailure::new(
                        1,
                        format!("working tree has uncommitted changes ({})", status),
                    ));
                }
                Ok(())
            }
            Step::CheckoutPages { branch } => Ok(self.git.checkout(branch)?),
            Step::RemoveIndex => {
                let git_dir = self.git.git_dir()?;
                Ok(site::remove_index(&git_dir)?)
            }
            Step::CleanTree {
                include_ignored,
                preserve,
            } => Ok(self.git.clean(*include_ignored, preserve)?),
            Step::RestoreSources { from, paths } => Ok(self.git.restore_paths(from, paths)?),
            Step::BuildDocs {
                program,
                args,
                directory,
            } => self.build(program, args, directory),
            Step::CopyOutput { from } => {
                let copied = site::copy_tree(&self.project.path(from), &self.project.root_path)?;
                tracing::info!("Copied {} generated files into the branch root", copied);
                Ok(())
            }
            Step::RemoveSources { paths } => {
                Ok(site::remove_paths(&self.project.root_path, paths)?)
            }
            Step::StageAll => Ok(self.git.stage_all()?),
            Step::Commit {
                template,
                allow_empty,
            } => {
                let branches = &self.project.config.branches;
                let hash = match &report.source_commit {
                    Some(hash) => hash.clone(),
                    None => {
                        let hash = self.git.short_hash(&branches.source)?;
                        report.source_commit = Some(hash.clone());
                        hash
                    }
                };
                let subject = if template.needs_commit() {
                    self.git.subject(&branches.source)?
                } else {
                    String::new()
                };
                let message = template.render(&CommitContext {
                    hash,
                    subject,
                    source: branches.source.clone(),
                    pages: branches.pages.clone(),
                });
                report.commit_message = Some(message.clone());
                Ok(self.git.commit(&message, *allow_empty)?)
            }
            Step::Push { remote, branch } => Ok(self.git.push(remote, branch)?),
            Step::ReturnToOrigin { branch } => Ok(self.git.checkout(branch)?),
        }
    }

    fn build(
        &self,
        program: &str,
        args: &[String],
        directory: &std::path::Path,
    ) -> std::result::Result<(), StepFailure> {
        let invocation =
            Invocation::new(program, args.iter().cloned(), &self.project.path(directory)).echo();
        let output = self.runner.run(&invocation)?;

        if output.success() {
            return Ok(());
        }

        let last_error = output
            .stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(str::to_string);
        let message = match (output.code, last_error) {
            (Some(_), Some(line)) => line,
            (Some(code), None) => format!("`{}` exited with {}", invocation.display(), code),
            (None, _) => format!("`{}` was terminated by a signal", invocation.display()),
        };
        Err(StepFailure::new(output.code.unwrap_or(1), message))
    }
}
