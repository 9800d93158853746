//! Job configuration from YAML

use crate::core::policy::ErrorPolicy;
use crate::core::step::{BuildStep, StepDefaults, StepSequence};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Workspace directory used when the config does not name one
pub const DEFAULT_WORKSPACE: &str = "./workspace";

/// Top-level job configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name
    pub name: String,

    /// Workspace directory (optional, defaults to ./workspace)
    #[serde(default)]
    pub workspace: Option<String>,

    /// What to do when a step fails
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Command used to enqueue downstream builds (optional)
    #[serde(default)]
    pub scheduler_cmd: Option<String>,

    /// Default timeout for step commands (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,

    /// Steps to run before checkout, in order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
///
/// Exactly one of `run` and `trigger` must be set; validation enforces
/// the step kind rather than leaving it to runtime inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    #[serde(default)]
    pub name: String,

    /// Optional step description
    #[serde(default)]
    pub description: Option<String>,

    /// Command run during the prepare phase
    #[serde(default)]
    pub prepare: Option<String>,

    /// Command run during the perform phase
    #[serde(default)]
    pub run: Option<String>,

    /// Downstream jobs to enqueue instead of running a command
    #[serde(default)]
    pub trigger: Option<Vec<String>>,

    /// Timeout for this step's commands (overrides the job default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl JobConfig {
    /// Load job configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse job configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the job configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Job name must not be empty");
        }

        let id_pattern = Regex::new(r"^[A-Za-z0-9._-]+$").expect("static pattern");

        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if step.id.is_empty() {
                anyhow::bail!("Step id must not be empty");
            }
            if !id_pattern.is_match(&step.id) {
                anyhow::bail!(
                    "Step id '{}' contains characters outside [A-Za-z0-9._-]",
                    step.id
                );
            }
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step id: {}", step.id);
            }

            match (&step.run, &step.trigger) {
                (Some(_), Some(_)) => {
                    anyhow::bail!(
                        "Step '{}' sets both 'run' and 'trigger'; a step is one or the other",
                        step.id
                    );
                }
                (None, None) => {
                    anyhow::bail!("Step '{}' sets neither 'run' nor 'trigger'", step.id);
                }
                (None, Some(jobs)) => {
                    if jobs.is_empty() {
                        anyhow::bail!("Step '{}' has an empty trigger list", step.id);
                    }
                    if jobs.iter().any(|job| job.is_empty()) {
                        anyhow::bail!("Step '{}' triggers a job with an empty name", step.id);
                    }
                    if step.prepare.is_some() {
                        anyhow::bail!(
                            "Step '{}' sets 'prepare' on a trigger step; triggers run no commands",
                            step.id
                        );
                    }
                }
                (Some(run), None) => {
                    if run.trim().is_empty() {
                        anyhow::bail!("Step '{}' has an empty 'run' command", step.id);
                    }
                }
            }
        }

        Ok(())
    }

    /// The configured workspace path, or the default
    pub fn workspace_path(&self) -> PathBuf {
        self.workspace
            .as_deref()
            .unwrap_or(DEFAULT_WORKSPACE)
            .into()
    }

    /// Convert the validated config into the domain step sequence
    pub fn to_sequence(&self) -> StepSequence {
        let defaults = StepDefaults {
            timeout_secs: self
                .default_timeout_secs
                .unwrap_or_else(|| StepDefaults::default().timeout_secs),
        };

        StepSequence::new(
            self.steps
                .iter()
                .map(|step| BuildStep::from_config(step, &defaults))
                .collect(),
        )
    }
}
