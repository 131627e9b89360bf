//! Errors that abort a gate run before a verdict is reached

use crate::baseline::BaselineError;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The program for an external step is not installed
    #[error("'{tool}' not found (needed by step '{step}'); install it and retry")]
    ToolMissing { step: String, tool: String },

    /// An external step ran but exited unsuccessfully
    #[error("step '{step}' failed{}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    StepFailed { step: String, code: Option<i32> },

    /// An external step could not be started for another reason
    #[error("could not start step '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// The previous run's report could not be removed before regenerating it
    #[error("could not remove old coverage report {}: {source}", .path.display())]
    StaleReport {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Baseline(#[from] BaselineError),
}
