//! Step executor - runs command steps through the shell

use crate::core::step::CommandStep;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Error types for step execution
#[derive(Debug, Error)]
pub enum StepError {
    #[error("exited with status {code}: {stderr}")]
    ExitStatus { code: i32, stderr: String },

    #[error("terminated by signal")]
    Signaled,

    #[error("failed to spawn: {0}")]
    Spawn(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),
}

/// Trait for running a command step's two phases - allows for different
/// implementations
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Run the step's prepare operation
    async fn prepare(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError>;

    /// Run the step's execute operation
    async fn execute(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError>;
}

#[async_trait]
impl<T: StepExecutor + ?Sized> StepExecutor for std::sync::Arc<T> {
    async fn prepare(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError> {
        (**self).prepare(step, workspace).await
    }

    async fn execute(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError> {
        (**self).execute(step, workspace).await
    }
}

/// Runs step commands through `sh -c` in the workspace directory
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn run_command(
        &self,
        command: &str,
        workspace: &Path,
        timeout_secs: u64,
    ) -> Result<(), StepError> {
        debug!("Running command in {}: {}", workspace.display(), command);

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(workspace)
            .output();

        let output = match timeout(Duration::from_secs(timeout_secs), output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(StepError::Spawn(e.to_string())),
            Err(_) => return Err(StepError::Timeout(timeout_secs)),
        };

        if output.status.success() {
            debug!(
                "Command succeeded: {}",
                String::from_utf8_lossy(&output.stdout).trim_end()
            );
            return Ok(());
        }

        match output.status.code() {
            Some(code) => Err(StepError::ExitStatus {
                code,
                stderr: stderr_tail(&output.stderr),
            }),
            None => Err(StepError::Signaled),
        }
    }
}

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn prepare(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError> {
        match &step.prepare {
            Some(command) => self.run_command(command, workspace, step.timeout_secs).await,
            // Nothing configured for the prepare phase
            None => Ok(()),
        }
    }

    async fn execute(&self, step: &CommandStep, workspace: &Path) -> Result<(), StepError> {
        self.run_command(&step.run, workspace, step.timeout_secs).await
    }
}

/// Last few lines of stderr, for error messages
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(4);
    lines[start..].join(" | ")
}
