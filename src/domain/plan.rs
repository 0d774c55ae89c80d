//! Publish plan construction and commit message templates.

use super::step::{top_level, Step};
use super::StepKind;
use crate::config::PublishConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

const PLACEHOLDERS: [&str; 4] = ["hash", "subject", "source", "pages"];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").unwrap())
}

/// Commit message template with `{hash}`, `{subject}`, `{source}` and `{pages}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTemplate {
    raw: String,
}

/// Values substituted into a [`CommitTemplate`]
#[derive(Debug, Clone, Default)]
pub struct CommitContext {
    pub hash: String,
    pub subject: String,
    pub source: String,
    pub pages: String,
}

impl CommitTemplate {
    /// Parse a template, rejecting unknown placeholders
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "publish.commit_message must not be empty".to_string(),
            ));
        }
        for caps in placeholder_pattern().captures_iter(raw) {
            let name = &caps[1];
            if !PLACEHOLDERS.contains(&name) {
                return Err(ConfigError::Invalid(format!(
                    "unknown placeholder {{{}}} in commit message (expected one of {})",
                    name,
                    PLACEHOLDERS.join(", ")
                )));
            }
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the rendered message depends on the source commit
    pub fn needs_commit(&self) -> bool {
        placeholder_pattern()
            .captures_iter(&self.raw)
            .any(|caps| &caps[1] == "hash" || &caps[1] == "subject")
    }

    pub fn render(&self, ctx: &CommitContext) -> String {
        placeholder_pattern()
            .replace_all(&self.raw, |caps: &regex::Captures<'_>| match &caps[1] {
                "hash" => ctx.hash.clone(),
                "subject" => ctx.subject.clone(),
                "source" => ctx.source.clone(),
                "pages" => ctx.pages.clone(),
                other => format!("{{{}}}", other),
            })
            .into_owned()
    }
}

/// Run-time choices that shape a plan
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Branch to check out at the end of the run
    pub return_branch: String,
    /// Push after committing (already combined with `publish.push`)
    pub push: bool,
}

/// Ordered steps of one publish run
#[derive(Debug, Clone)]
pub struct PublishPlan {
    steps: Vec<Step>,
}

impl PublishPlan {
    /// Build the plan for a configuration
    pub fn build(config: &PublishConfig, options: &PlanOptions) -> Result<Self, ConfigError> {
        let template = CommitTemplate::parse(&config.publish.commit_message)?;
        let mut steps = Vec::new();

        if config.publish.require_clean {
            steps.push(Step::VerifyClean);
        }

        steps.push(Step::CheckoutPages {
            branch: config.branches.pages.clone(),
        });
        steps.push(Step::RemoveIndex);
        steps.push(Step::CleanTree {
            include_ignored: config.publish.clean_ignored,
            preserve: config.publish.preserve.clone(),
        });
        steps.push(Step::RestoreSources {
            from: config.branches.source.clone(),
            paths: config.sources.paths.clone(),
        });
        steps.push(Step::BuildDocs {
            program: config.build.program.clone(),
            args: config.build.args.clone(),
            directory: config.build.directory.clone(),
        });
        steps.push(Step::CopyOutput {
            from: config.build.output.clone(),
        });

        // The build output goes too when it lives outside the restored sources
        let mut removed = config.sources.paths.clone();
        if let Some(output_root) = top_level(&config.build.output) {
            let covered = removed
                .iter()
                .any(|p| top_level(p).as_ref() == Some(&output_root));
            if !covered {
                removed.push(output_root);
            }
        }
        steps.push(Step::RemoveSources { paths: removed });

        steps.push(Step::StageAll);
        steps.push(Step::Commit {
            template,
            allow_empty: config.publish.allow_empty,
        });
        if options.push {
            steps.push(Step::Push {
                remote: config.branches.remote.clone(),
                branch: config.branches.pages.clone(),
            });
        }
        steps.push(Step::ReturnToOrigin {
            branch: options.return_branch.clone(),
        });

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Branch checked out by the final step
    pub fn return_branch(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| match s {
            Step::ReturnToOrigin { branch } => Some(branch.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, kind: StepKind) -> bool {
        self.steps.iter().any(|s| s.kind() == kind)
    }

    /// Numbered listing of the shell-equivalent commands
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{:02} {:<16} {}", i + 1, step.kind(), step.command()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
