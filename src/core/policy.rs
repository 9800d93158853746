//! Error policy model

use serde::{Deserialize, Serialize};

/// What to do when a step fails
///
/// Selected once per job configuration and applied identically to every
/// step failure in both phases. Only the three spelled-out values are
/// accepted from configuration; anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and continue with the next step
    Ignore,

    /// Abort the whole build as failed
    #[serde(rename = "fail")]
    FailBuild,

    /// Stop the run and mark the build not built
    #[serde(rename = "terminate")]
    TerminateBuild,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Ignore
    }
}
