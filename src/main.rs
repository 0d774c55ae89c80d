//! ghpages-publish: regenerate the documentation site and publish it on the
//! gh-pages branch.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghpages_publish::cli::{Cli, Commands};
use ghpages_publish::domain::{Project, PublishPlan};
use ghpages_publish::{PublishConfig, Publisher};

/// Initialize logging with RUST_LOG environment variable support
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn print_plan(plan: &PublishPlan, json: bool) -> Result<()> {
    if json {
        let steps: Vec<_> = plan
            .steps()
            .iter()
            .map(|step| {
                serde_json::json!({
                    "step": step.kind(),
                    "policy": step.policy(),
                    "command": step.command(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        println!("{}", plan.render());
    }
    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let start = match &cli.repo {
        Some(path) => path.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let root = Project::discover(Some(start.clone()));

    let config = PublishConfig::load(root.as_deref(), cli.config.as_deref())?;

    if let Commands::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let root = root.ok_or_else(|| anyhow!("not inside a git repository: {}", start.display()))?;
    tracing::debug!("Repository root {:?}", root);

    match cli.command {
        Commands::Plan { no_push } => {
            let publisher = Publisher::open(root, config, false)?;
            print_plan(&publisher.plan(no_push)?, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::GhPages { dry_run: true, no_push } => {
            let publisher = Publisher::open(root, config, false)?;
            print_plan(&publisher.plan(no_push)?, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::GhPages { dry_run: false, no_push } => {
            let publisher = Publisher::open(root, config, true)?;
            let plan = publisher.plan(no_push)?;

            // Ctrl+C stops after the current step; the branch switch back still runs
            let cancel = Arc::new(AtomicBool::new(false));
            let flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Received Ctrl+C, stopping after the current step");
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let report =
                tokio::task::spawn_blocking(move || publisher.publish(&plan, &cancel)).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary());
            }
            Ok(exit_code(report.exit_code))
        }
        Commands::Config => Ok(ExitCode::SUCCESS),
    }
}
