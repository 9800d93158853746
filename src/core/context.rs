//! Build context - log sink, result slot, and workspace handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Final result of the containing build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildResult {
    /// The build ran to completion
    Success,

    /// The build was aborted as failed
    Failure,

    /// The build was stopped before doing real work and should not be
    /// counted as failed
    NotBuilt,
}

/// Append-only log sink for one run
///
/// Lines are retained for inspection and mirrored to `tracing` so they
/// show up in the live output.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append a line to the log
    pub fn append(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.push(line);
    }

    /// All lines appended so far, in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains the given text
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// Execution context for one pre-checkout run
///
/// Owns everything the runner mutates: the log sink, the build's result
/// slot, and the workspace handle. Nothing in here survives the run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Unique run identifier, carried in synthetic build causes
    pub run_id: Uuid,

    /// Workspace directory steps run in
    pub workspace: PathBuf,

    /// Append-only run log
    pub log: RunLog,

    /// The build's result slot; `None` until something sets it
    pub result: Option<BuildResult>,

    /// When the run started
    pub started_at: DateTime<Utc>,
}

impl BuildContext {
    /// Create a fresh context for a run in the given workspace
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workspace: workspace.into(),
            log: RunLog::new(),
            result: None,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_append_and_contains() {
        let mut log = RunLog::new();
        log.append("Success build for compile");
        log.append(format!("Scheduling build for {}", "docs"));

        assert_eq!(log.lines().len(), 2);
        assert!(log.contains("Success build for compile"));
        assert!(log.contains("Scheduling build for docs"));
        assert!(!log.contains("Failed"));
    }

    #[test]
    fn test_fresh_context_has_no_result() {
        let ctx = BuildContext::new("/tmp/ws");
        assert_eq!(ctx.result, None);
        assert!(ctx.log.lines().is_empty());
        assert_eq!(ctx.workspace, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn test_contexts_get_distinct_run_ids() {
        let a = BuildContext::new("/tmp/ws");
        let b = BuildContext::new("/tmp/ws");
        assert_ne!(a.run_id, b.run_id);
    }
}
