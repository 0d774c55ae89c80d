//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ghpages-publish",
    version,
    about = "Regenerate the documentation site and publish it on the gh-pages branch"
)]
pub struct Cli {
    /// Repository to publish (defaults to the enclosing repository of the current directory)
    #[arg(short = 'C', long = "repo", global = true)]
    pub repo: Option<PathBuf>,

    /// Additional config file, applied after project and user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the documentation and publish it on the publishing branch
    #[command(name = "gh-pages")]
    GhPages {
        /// Print the steps without running anything
        #[arg(long)]
        dry_run: bool,

        /// Commit locally but do not push
        #[arg(long)]
        no_push: bool,
    },

    /// Print the steps a publish run would take
    Plan {
        /// Leave out the push step
        #[arg(long)]
        no_push: bool,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_gh_pages() {
        let cli = Cli::parse_from(["ghpages-publish", "-C", "/srv/docs", "gh-pages", "--no-push"]);
        assert_eq!(cli.repo, Some(PathBuf::from("/srv/docs")));
        assert!(matches!(
            cli.command,
            Commands::GhPages {
                dry_run: false,
                no_push: true
            }
        ));
    }
}
