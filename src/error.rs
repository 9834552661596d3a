//! Error types for the build orchestrator.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for failures raised by the orchestrator itself.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status after the build was interrupted by a signal.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Errors that abort a build before an outcome can be reported.
///
/// A backend that runs and exits nonzero is not an error here; it is a
/// failed [`BuildOutcome`](crate::backend::BuildOutcome) whose status is
/// passed through untouched.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The package root or the backend tool is unusable.
    #[error("environment error: {0}")]
    Environment(String),

    /// Purging stale artifacts failed; no release build was attempted.
    #[error("failed to clean {}: {source}", path.display())]
    CleanState {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build was cancelled and the backend process was stopped.
    #[error("build interrupted by {signal}; backend process stopped")]
    Interrupted { signal: &'static str },
}

impl BuildError {
    /// Process exit status to use when this error ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Environment(_) | BuildError::CleanState { .. } => EXIT_FAILURE,
            BuildError::Interrupted { .. } => EXIT_INTERRUPTED,
        }
    }
}
