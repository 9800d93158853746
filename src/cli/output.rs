//! CLI output formatting

use crate::core::{context::BuildResult, state::RunOutcome};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while the runner works
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a build result for display
pub fn format_result(result: BuildResult) -> String {
    match result {
        BuildResult::Success => style("SUCCESS").green().to_string(),
        BuildResult::Failure => style("FAILURE").red().to_string(),
        BuildResult::NotBuilt => style("NOT_BUILT").dim().to_string(),
    }
}

/// Format a run outcome for display
pub fn format_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => format!("{}all steps completed", CHECK),
        RunOutcome::FatalAbort { reason } => {
            format!("{}aborted: {}", CROSS, style(reason).red())
        }
        RunOutcome::GracefulTerminate { reason } => {
            format!("{}terminated: {}", WARN, style(reason).yellow())
        }
    }
}
