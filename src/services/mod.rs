//! Infrastructure services for ghpages-publish.
//!
//! This module contains:
//! - GitService: Git CLI operations on the repository
//! - process: CommandRunner, SystemRunner and the per-run log
//! - site: Copying generated HTML and removing temporary sources
//! - Publisher: Step-by-step execution of a publish plan

mod git;
pub mod process;
mod publisher;
pub mod site;

pub use git::GitService;
pub use process::{CommandOutput, CommandRunner, Invocation, RunLog, SystemRunner};
pub use publisher::Publisher;
