//! Pre-checkout runner - walks the step sequence before checkout

use crate::core::{
    context::{BuildContext, BuildResult},
    policy::ErrorPolicy,
    state::{Phase, RunOutcome},
    step::{BuildStep, StepSequence, TriggerStep},
};
use crate::execution::executor::StepExecutor;
use crate::execution::scheduler::{
    BuildCause, JobScheduler, ScheduleRequest, MIN_QUIET_PERIOD_SECS,
};
use anyhow::{Context, Result};
use tracing::warn;

/// Runs the configured step sequence at the pre-checkout extension point
///
/// One invocation walks the sequence twice: a prepare pass over every
/// step, then a perform pass that executes command steps and enqueues
/// trigger steps' downstream jobs. The error policy is applied the same
/// way to any step failure in either pass. No state survives a run.
pub struct PreCheckoutRunner<E, S> {
    steps: StepSequence,
    policy: ErrorPolicy,
    executor: E,
    scheduler: S,
}

impl<E: StepExecutor, S: JobScheduler> PreCheckoutRunner<E, S> {
    /// Create a runner for the given sequence and policy
    ///
    /// An empty sequence is accepted and makes the run a no-op.
    pub fn new(steps: StepSequence, policy: ErrorPolicy, executor: E, scheduler: S) -> Self {
        Self {
            steps,
            policy,
            executor,
            scheduler,
        }
    }

    /// Run all configured steps before checkout
    ///
    /// Returns `Err` only for infrastructure failures (workspace
    /// creation); step failures are folded into the returned
    /// [`RunOutcome`] according to the error policy.
    pub async fn run_before_checkout(&self, ctx: &mut BuildContext) -> Result<RunOutcome> {
        self.ensure_workspace(ctx).await?;

        if self.steps.is_empty() {
            ctx.log.append("No steps declared, nothing to run before checkout");
            return Ok(RunOutcome::Completed);
        }

        ctx.log.append("Running steps before checkout");

        // Prepare pass
        for step in self.steps.iter() {
            let result = match step {
                BuildStep::Command(cmd) => self.executor.prepare(cmd, &ctx.workspace).await,
                // Triggers have nothing to prepare
                BuildStep::Trigger(_) => Ok(()),
            };

            if let Err(err) = result {
                ctx.log
                    .append(format!("Failed pre build for {}: {}", step.name(), err));
                if let Some(outcome) = self.apply_policy(step.name(), Phase::Prepare, ctx) {
                    return Ok(outcome);
                }
            }
        }

        // Perform pass
        for step in self.steps.iter() {
            match step {
                BuildStep::Trigger(trigger) => self.schedule_downstream(trigger, ctx).await,
                BuildStep::Command(cmd) => {
                    match self.executor.execute(cmd, &ctx.workspace).await {
                        Ok(()) => {
                            ctx.log.append(format!("Success build for {}", step.name()));
                        }
                        Err(err) => {
                            ctx.log
                                .append(format!("Failed build for {}: {}", step.name(), err));
                            if let Some(outcome) =
                                self.apply_policy(step.name(), Phase::Perform, ctx)
                            {
                                return Ok(outcome);
                            }
                        }
                    }
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Create the workspace if it does not exist yet
    ///
    /// Steps may assume the workspace directory is present.
    async fn ensure_workspace(&self, ctx: &mut BuildContext) -> Result<()> {
        if !ctx.workspace.exists() {
            tokio::fs::create_dir_all(&ctx.workspace)
                .await
                .with_context(|| {
                    format!("Failed to create workspace {}", ctx.workspace.display())
                })?;
            ctx.log
                .append(format!("Created workspace {}", ctx.workspace.display()));
        }
        Ok(())
    }

    /// Enqueue every downstream job of a trigger step
    ///
    /// Fire and forget: a refused enqueue is logged and never fed to the
    /// error policy.
    async fn schedule_downstream(&self, trigger: &TriggerStep, ctx: &mut BuildContext) {
        for job in &trigger.jobs {
            ctx.log.append(format!("Scheduling build for {}", job));

            let request = ScheduleRequest {
                job: job.clone(),
                quiet_period_secs: MIN_QUIET_PERIOD_SECS,
                cause: BuildCause::UpstreamStep { run_id: ctx.run_id },
            };

            if let Err(err) = self.scheduler.schedule_build(request).await {
                warn!("Enqueue of {} was refused: {}", job, err);
                ctx.log
                    .append(format!("Could not schedule build for {}: {}", job, err));
            }
        }
    }

    /// Apply the error policy to a step failure
    ///
    /// Returns the outcome that ends the run, or `None` to continue with
    /// the next step.
    fn apply_policy(
        &self,
        step_name: &str,
        phase: Phase,
        ctx: &mut BuildContext,
    ) -> Option<RunOutcome> {
        match self.policy {
            ErrorPolicy::Ignore => {
                ctx.log.append(format!(
                    "Continuing after failed {} for {}",
                    phase, step_name
                ));
                None
            }
            ErrorPolicy::FailBuild => {
                let reason = format!("{} failed during {}", step_name, phase);
                ctx.log.append(format!("Aborting build: {}", reason));
                Some(RunOutcome::FatalAbort { reason })
            }
            ErrorPolicy::TerminateBuild => {
                ctx.result = Some(BuildResult::NotBuilt);
                let reason = format!("{} failed during {}", step_name, phase);
                ctx.log
                    .append(format!("Terminating build, marked not built: {}", reason));
                Some(RunOutcome::GracefulTerminate { reason })
            }
        }
    }
}
