//! Build step domain model

use crate::core::config::StepConfig;

/// A single build step configured to run before checkout
///
/// Steps form a closed set of kinds distinguished by an explicit tag:
/// command steps do work through their prepare/execute phases, trigger
/// steps only enqueue downstream builds.
#[derive(Debug, Clone)]
pub enum BuildStep {
    /// A step that runs commands in the workspace
    Command(CommandStep),

    /// A step that enqueues builds of downstream jobs
    Trigger(TriggerStep),
}

/// A command step with an optional prepare command and a run command
#[derive(Debug, Clone)]
pub struct CommandStep {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Command run during the prepare phase (skipped when absent)
    pub prepare: Option<String>,

    /// Command run during the perform phase
    pub run: String,

    /// Timeout in seconds for each command
    pub timeout_secs: u64,
}

/// A trigger step carrying the downstream jobs to enqueue
#[derive(Debug, Clone)]
pub struct TriggerStep {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Names of the downstream jobs to enqueue
    pub jobs: Vec<String>,
}

impl BuildStep {
    /// Create a step from a step config
    pub fn from_config(config: &StepConfig, defaults: &StepDefaults) -> Self {
        let name = if config.name.is_empty() {
            config.id.clone()
        } else {
            config.name.clone()
        };

        if let Some(jobs) = &config.trigger {
            BuildStep::Trigger(TriggerStep {
                id: config.id.clone(),
                name,
                jobs: jobs.clone(),
            })
        } else {
            BuildStep::Command(CommandStep {
                id: config.id.clone(),
                name,
                prepare: config.prepare.clone(),
                run: config.run.clone().unwrap_or_default(),
                timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            })
        }
    }

    /// The step's unique identifier
    pub fn id(&self) -> &str {
        match self {
            BuildStep::Command(step) => &step.id,
            BuildStep::Trigger(step) => &step.id,
        }
    }

    /// The step's display name, used in log lines
    pub fn name(&self) -> &str {
        match self {
            BuildStep::Command(step) => &step.name,
            BuildStep::Trigger(step) => &step.name,
        }
    }
}

/// The ordered sequence of steps to run before checkout
///
/// Insertion order is execution order. The sequence is set at
/// configuration time and never mutated during a run.
#[derive(Debug, Clone, Default)]
pub struct StepSequence(Vec<BuildStep>);

impl StepSequence {
    /// Create a sequence from an ordered list of steps
    pub fn new(steps: Vec<BuildStep>) -> Self {
        Self(steps)
    }

    /// Number of steps in the sequence
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sequence has no steps (a valid, no-op configuration)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the steps in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, BuildStep> {
        self.0.iter()
    }
}

/// Defaults applied to steps that do not override them
#[derive(Debug, Clone)]
pub struct StepDefaults {
    pub timeout_secs: u64,
}

impl Default for StepDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 600, // 10 minutes
        }
    }
}
