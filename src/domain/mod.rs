//! Domain entities for ghpages-publish.
//!
//! This module contains the core entities:
//! - Step: One action of the publishing recipe and its failure policy
//! - PublishPlan: The ordered steps of a run and the commit message template
//! - PublishReport: What happened to every step of a run
//! - Project: The repository context
//! - WorktreeStatus: Working tree cleanliness

mod plan;
mod project;
mod report;
mod step;
mod worktree;

pub use plan::{CommitContext, CommitTemplate, PlanOptions, PublishPlan};
pub use project::Project;
pub use report::{OutputStream, PublishReport, StepOutcome, StepRecord};
pub use step::{FailurePolicy, Step, StepKind};
pub use worktree::WorktreeStatus;
