//! Test utilities for the pre-checkout runner

use async_trait::async_trait;
use prescm::core::context::BuildContext;
use prescm::core::policy::ErrorPolicy;
use prescm::core::state::{Phase, RunOutcome};
use prescm::core::step::{BuildStep, CommandStep, StepSequence, TriggerStep};
use prescm::execution::executor::{StepError, StepExecutor};
use prescm::execution::runner::PreCheckoutRunner;
use prescm::execution::scheduler::{
    InMemoryScheduler, JobScheduler, ScheduleError, ScheduleRequest,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Executor scripted to fail the steps it is told to fail
///
/// Records every invocation so tests can assert which steps were
/// attempted, in which phase, and in which order.
pub struct ScriptedExecutor {
    prepare_failures: HashSet<String>,
    execute_failures: HashSet<String>,
    calls: Mutex<Vec<(Phase, String)>>,
}

impl ScriptedExecutor {
    pub fn passing() -> Arc<Self> {
        Self::with_failures(&[], &[])
    }

    pub fn failing_prepare(ids: &[&str]) -> Arc<Self> {
        Self::with_failures(ids, &[])
    }

    pub fn failing_execute(ids: &[&str]) -> Arc<Self> {
        Self::with_failures(&[], ids)
    }

    pub fn with_failures(prepare: &[&str], execute: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            prepare_failures: prepare.iter().map(|s| s.to_string()).collect(),
            execute_failures: execute.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every (phase, step id) invocation, in order
    pub fn calls(&self) -> Vec<(Phase, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times a step's execute operation ran
    pub fn execute_count(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(phase, step)| *phase == Phase::Perform && step == id)
            .count()
    }

    fn scripted_failure() -> StepError {
        StepError::ExitStatus {
            code: 1,
            stderr: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn prepare(&self, step: &CommandStep, _workspace: &Path) -> Result<(), StepError> {
        self.calls
            .lock()
            .unwrap()
            .push((Phase::Prepare, step.id.clone()));
        if self.prepare_failures.contains(&step.id) {
            Err(Self::scripted_failure())
        } else {
            Ok(())
        }
    }

    async fn execute(&self, step: &CommandStep, _workspace: &Path) -> Result<(), StepError> {
        self.calls
            .lock()
            .unwrap()
            .push((Phase::Perform, step.id.clone()));
        if self.execute_failures.contains(&step.id) {
            Err(Self::scripted_failure())
        } else {
            Ok(())
        }
    }
}

/// Scheduler that refuses every request
pub struct RefusingScheduler;

#[async_trait]
impl JobScheduler for RefusingScheduler {
    async fn schedule_build(&self, _request: ScheduleRequest) -> Result<(), ScheduleError> {
        Err(ScheduleError::CommandStatus(1))
    }
}

/// A command step that would run `true`
pub fn command_step(id: &str) -> BuildStep {
    command_step_with(id, "true")
}

/// A command step with the given run command
pub fn command_step_with(id: &str, run: &str) -> BuildStep {
    BuildStep::Command(CommandStep {
        id: id.to_string(),
        name: id.to_string(),
        prepare: None,
        run: run.to_string(),
        timeout_secs: 60,
    })
}

/// A command step with a prepare-phase command as well
pub fn command_step_with_prepare(id: &str, prepare: &str, run: &str) -> BuildStep {
    BuildStep::Command(CommandStep {
        id: id.to_string(),
        name: id.to_string(),
        prepare: Some(prepare.to_string()),
        run: run.to_string(),
        timeout_secs: 60,
    })
}

/// A trigger step for the given downstream jobs
pub fn trigger_step(id: &str, jobs: &[&str]) -> BuildStep {
    BuildStep::Trigger(TriggerStep {
        id: id.to_string(),
        name: id.to_string(),
        jobs: jobs.iter().map(|s| s.to_string()).collect(),
    })
}

/// A context whose workspace is a fresh temp directory
pub fn test_context() -> BuildContext {
    let workspace = std::env::temp_dir().join(format!("prescm-test-{}", uuid::Uuid::new_v4()));
    BuildContext::new(workspace)
}

/// Run a sequence with the scripted executor and an in-memory scheduler
pub async fn run_steps(
    steps: Vec<BuildStep>,
    policy: ErrorPolicy,
    executor: Arc<ScriptedExecutor>,
) -> (RunOutcome, BuildContext, Arc<InMemoryScheduler>) {
    let scheduler = Arc::new(InMemoryScheduler::new());
    let runner = PreCheckoutRunner::new(
        StepSequence::new(steps),
        policy,
        executor,
        Arc::clone(&scheduler),
    );
    let mut ctx = test_context();
    let outcome = runner
        .run_before_checkout(&mut ctx)
        .await
        .expect("runner infrastructure should not fail");
    (outcome, ctx, scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_executor_records_calls() {
        let executor = ScriptedExecutor::failing_execute(&["b"]);
        let (outcome, _ctx, _scheduler) = run_steps(
            vec![command_step("a"), command_step("b")],
            ErrorPolicy::Ignore,
            Arc::clone(&executor),
        )
        .await;

        assert!(outcome.is_completed());
        assert_eq!(
            executor.calls(),
            vec![
                (Phase::Prepare, "a".to_string()),
                (Phase::Prepare, "b".to_string()),
                (Phase::Perform, "a".to_string()),
                (Phase::Perform, "b".to_string()),
            ]
        );
        assert_eq!(executor.execute_count("a"), 1);
    }

    #[test]
    fn test_test_context_uses_fresh_workspace() {
        let a = test_context();
        let b = test_context();
        assert_ne!(a.workspace, b.workspace);
        assert!(!a.workspace.exists());
    }
}
