//! CLI command definitions

use crate::core::policy::ErrorPolicy;
use clap::Args;

/// Run the pre-checkout steps of a job
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,

    /// Workspace directory (overrides the config)
    #[arg(long)]
    pub workspace: Option<String>,

    /// Error policy (overrides the config)
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicyArg>,

    /// Enqueue command for downstream triggers (overrides the config)
    #[arg(long)]
    pub scheduler_cmd: Option<String>,
}

/// Validate a job configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Error policy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicyArg {
    Ignore,
    Fail,
    Terminate,
}

impl From<ErrorPolicyArg> for ErrorPolicy {
    fn from(arg: ErrorPolicyArg) -> Self {
        match arg {
            ErrorPolicyArg::Ignore => ErrorPolicy::Ignore,
            ErrorPolicyArg::Fail => ErrorPolicy::FailBuild,
            ErrorPolicyArg::Terminate => ErrorPolicy::TerminateBuild,
        }
    }
}
