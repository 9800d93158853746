mod cli;
mod core;
mod execution;

use anyhow::{Context, Result};
use cli::commands::{RunCommand, ValidateCommand};
use cli::output::*;
use cli::{Cli, Command};
use crate::core::config::JobConfig;
use crate::core::context::{BuildContext, BuildResult};
use crate::core::state::RunOutcome;
use crate::execution::executor::ShellExecutor;
use crate::execution::runner::PreCheckoutRunner;
use crate::execution::scheduler::{InMemoryScheduler, JobScheduler, SubprocessScheduler};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_job(cmd).await?,
        Command::Validate(cmd) => validate_job(cmd)?,
    }

    Ok(())
}

async fn run_job(cmd: &RunCommand) -> Result<()> {
    // Load job config
    let config = JobConfig::from_file(&cmd.file).context("Failed to load job config")?;

    println!("{} Loaded job: {}", INFO, style(&config.name).bold());

    // CLI flags override the config
    let policy = cmd.on_error.map(Into::into).unwrap_or(config.on_error);
    let workspace = cmd
        .workspace
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.workspace_path());
    let scheduler_cmd = cmd
        .scheduler_cmd
        .clone()
        .or_else(|| config.scheduler_cmd.clone());

    // Without an enqueue command, trigger requests are only recorded
    let scheduler: Box<dyn JobScheduler> = match scheduler_cmd {
        Some(enqueue) => Box::new(SubprocessScheduler::new(enqueue)),
        None => Box::new(InMemoryScheduler::new()),
    };

    let sequence = config.to_sequence();
    let total_steps = sequence.len();
    let runner = PreCheckoutRunner::new(sequence, policy, ShellExecutor::new(), scheduler);

    let mut ctx = BuildContext::new(workspace);

    println!(
        "{} Running {} steps before checkout",
        ROCKET,
        style(total_steps).cyan()
    );
    let spinner = create_spinner(format!("running {} steps", total_steps));
    let outcome = runner.run_before_checkout(&mut ctx).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    // The runner only touches the result slot itself on termination;
    // the caller marks the build for the other outcomes
    let result = match &outcome {
        RunOutcome::Completed => ctx.result.unwrap_or(BuildResult::Success),
        RunOutcome::FatalAbort { .. } => BuildResult::Failure,
        RunOutcome::GracefulTerminate { .. } => ctx.result.unwrap_or(BuildResult::NotBuilt),
    };

    println!("\n{}", format_outcome(&outcome));
    println!("  Build result: {}", format_result(result));

    match outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::FatalAbort { .. } => std::process::exit(1),
        RunOutcome::GracefulTerminate { .. } => std::process::exit(2),
    }
}

fn validate_job(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating job configuration...", INFO);

    match JobConfig::from_file(&cmd.file) {
        Ok(config) => {
            let triggers = config
                .steps
                .iter()
                .filter(|step| step.trigger.is_some())
                .count();

            println!("{} Job configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!(
                "  Steps: {} ({} triggers)",
                style(config.steps.len()).cyan(),
                style(triggers).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
