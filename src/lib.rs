//! ghpages-publish: regenerate a documentation site and publish it on a
//! dedicated git branch.
//!
//! A run checks out the publishing branch, cleans it, restores the
//! documentation sources from the source branch, runs the documentation
//! generator, copies the generated HTML into the branch root, commits and
//! pushes, then switches back to the branch it started from.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

pub use config::PublishConfig;
pub use domain::{PublishPlan, PublishReport};
pub use error::{PublishError, Result};
pub use services::Publisher;
