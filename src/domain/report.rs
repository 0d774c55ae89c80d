//! Outcome of a publish run and its steps.

use super::step::commit_command;
use super::{FailurePolicy, Step, StepKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit code reported when a run is interrupted with Ctrl+C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Result of executing (or not executing) a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Failed, but the step's policy lets the run continue
    Tolerated { message: String },
    Failed { exit_code: i32, message: String },
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Get status indicator for terminal output
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Succeeded => "✓",
            Self::Tolerated { .. } => "~",
            Self::Failed { .. } => "✗",
            Self::Skipped { .. } => "⊘",
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepKind,
    pub policy: FailurePolicy,
    pub command: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

impl StepRecord {
    pub fn new(step: &Step, outcome: StepOutcome, duration: Duration) -> Self {
        Self {
            step: step.kind(),
            policy: step.policy(),
            command: step.command(),
            outcome,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Record for the commit step, showing the message actually used
    pub fn commit(step: &Step, message: &str, outcome: StepOutcome, duration: Duration) -> Self {
        let mut record = Self::new(step, outcome, duration);
        if let Step::Commit { allow_empty, .. } = step {
            record.command = commit_command(message, *allow_empty);
        }
        record
    }
}

/// Which stream a line of command output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    /// Prefix used in run logs
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Stdout => "[OUT]",
            Self::Stderr => "[ERR]",
        }
    }
}

/// Everything that happened during one publish run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub source_branch: String,
    pub pages_branch: String,
    pub return_branch: String,
    /// Short hash of the source branch tip, once resolved
    pub source_commit: Option<String>,
    pub commit_message: Option<String>,
    pub interrupted: bool,
    pub steps: Vec<StepRecord>,
    pub exit_code: i32,
}

impl PublishReport {
    pub fn new(source_branch: &str, pages_branch: &str, return_branch: &str) -> Self {
        Self {
            source_branch: source_branch.to_string(),
            pages_branch: pages_branch.to_string(),
            return_branch: return_branch.to_string(),
            source_commit: None,
            commit_message: None,
            interrupted: false,
            steps: Vec::new(),
            exit_code: 0,
        }
    }

    pub fn record(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// First failure that stopped the run, ignoring the final branch switch
    pub fn first_failure(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|r| r.outcome.is_failed() && r.policy != FailurePolicy::Always)
    }

    pub fn outcome_of(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == kind)
            .map(|r| &r.outcome)
    }

    /// Compute and store the process exit code.
    ///
    /// An interrupt wins; otherwise the first failed step decides, and the
    /// final branch switch only counts when nothing else failed.
    pub fn finish(&mut self) {
        self.exit_code = if self.interrupted {
            INTERRUPTED_EXIT_CODE
        } else if let Some(StepOutcome::Failed { exit_code, .. }) =
            self.first_failure().map(|r| &r.outcome)
        {
            *exit_code
        } else if let Some(StepOutcome::Failed { exit_code, .. }) = self
            .steps
            .iter()
            .map(|r| &r.outcome)
            .find(|o| o.is_failed())
        {
            *exit_code
        } else {
            0
        };
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Human-readable summary for the terminal
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.steps {
            let detail = match &record.outcome {
                StepOutcome::Succeeded => String::new(),
                StepOutcome::Tolerated { message } => format!(" (ignored: {})", message),
                StepOutcome::Failed { exit_code, message } => {
                    format!(" (exit {}: {})", exit_code, message)
                }
                StepOutcome::Skipped { reason } => format!(" (skipped: {})", reason),
            };
            lines.push(format!(
                "{} {:<16} {}{}",
                record.outcome.indicator(),
                record.step,
                record.command,
                detail
            ));
        }
        let verdict = if self.succeeded() {
            match &self.source_commit {
                Some(hash) => format!(
                    "Published {} from {}@{}",
                    self.pages_branch, self.source_branch, hash
                ),
                None => format!("Published {}", self.pages_branch),
            }
        } else if self.interrupted {
            "Interrupted".to_string()
        } else {
            format!("Failed with exit code {}", self.exit_code)
        };
        lines.push(verdict);
        lines.join("\n")
    }
}
