//! Downstream job scheduling

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Quiet period requested for builds enqueued by the runner, in seconds
///
/// Always the minimum delay: a triggered build may start as soon as the
/// host queue picks it up.
pub const MIN_QUIET_PERIOD_SECS: u64 = 0;

/// Why a downstream build was enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildCause {
    /// Enqueued by a trigger step of another run, not by a user
    UpstreamStep { run_id: Uuid },
}

/// One request to enqueue a downstream build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Name of the job to build
    pub job: String,

    /// Seconds the host queue should wait before starting the build
    pub quiet_period_secs: u64,

    /// Synthetic cause recorded against the downstream build
    pub cause: BuildCause,
}

/// Error types for scheduling operations
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("enqueue command exited with status {0}")]
    CommandStatus(i32),

    #[error("failed to run enqueue command: {0}")]
    Io(String),
}

/// Trait for handing build requests to the host queue - allows for
/// different implementations
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Enqueue a build of the requested job
    ///
    /// Fire and forget: callers never observe the downstream build
    /// beyond the success or failure of the enqueue itself.
    async fn schedule_build(&self, request: ScheduleRequest) -> Result<(), ScheduleError>;
}

#[async_trait]
impl<T: JobScheduler + ?Sized> JobScheduler for std::sync::Arc<T> {
    async fn schedule_build(&self, request: ScheduleRequest) -> Result<(), ScheduleError> {
        (**self).schedule_build(request).await
    }
}

#[async_trait]
impl<T: JobScheduler + ?Sized> JobScheduler for Box<T> {
    async fn schedule_build(&self, request: ScheduleRequest) -> Result<(), ScheduleError> {
        (**self).schedule_build(request).await
    }
}

/// Hands requests to the host queue by invoking a configured enqueue
/// command with the job name and quiet period as arguments
#[derive(Debug, Clone)]
pub struct SubprocessScheduler {
    command: String,
}

impl SubprocessScheduler {
    /// Create a scheduler that invokes the given enqueue command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The configured enqueue command
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl JobScheduler for SubprocessScheduler {
    async fn schedule_build(&self, request: ScheduleRequest) -> Result<(), ScheduleError> {
        debug!("Enqueueing {} via {}", request.job, self.command);

        let status = tokio::process::Command::new(&self.command)
            .arg(&request.job)
            .arg(request.quiet_period_secs.to_string())
            .status()
            .await
            .map_err(|e| ScheduleError::Io(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(ScheduleError::CommandStatus(status.code().unwrap_or(-1)))
        }
    }
}

/// Records requests in memory without enqueueing anything
///
/// Used when no enqueue command is configured, and by tests that assert
/// on what would have been scheduled.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    requests: Mutex<Vec<ScheduleRequest>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<ScheduleRequest> {
        self.requests.lock().expect("scheduler lock").clone()
    }
}

#[async_trait]
impl JobScheduler for InMemoryScheduler {
    async fn schedule_build(&self, request: ScheduleRequest) -> Result<(), ScheduleError> {
        self.requests.lock().expect("scheduler lock").push(request);
        Ok(())
    }
}
