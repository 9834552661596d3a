//! Turns a backend outcome into a status message and exit code.

use std::time::Duration;

use crate::backend::BuildOutcome;
use crate::mode::BuildMode;

/// Final result of a run, ready to print and exit with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Success text; `None` whenever the build did not succeed
    pub message: Option<String>,
    /// Process exit status
    pub exit_code: i32,
}

/// Consume the outcome of the backend run.
///
/// On success the exit code is 0 and the message depends on the mode.
/// On failure there is no message and the backend's status is kept as is.
pub fn report(mode: BuildMode, outcome: BuildOutcome, elapsed: Duration) -> Report {
    if !outcome.success() {
        return Report {
            message: None,
            exit_code: outcome.code(),
        };
    }

    Report {
        message: Some(success_message(mode, elapsed)),
        exit_code: 0,
    }
}

fn success_message(mode: BuildMode, elapsed: Duration) -> String {
    let detail = match mode {
        BuildMode::Development => {
            "  Extension installed into the active Python environment\n\
             \nNext: import the module from Python to try it"
        }
        BuildMode::Distribution => {
            "  Release wheel written to the backend's output directory\n\
             \nNext: upload the wheel or install it with pip"
        }
    };

    format!(
        "=== {} Build Complete ({}) ===\n{}",
        mode.label(),
        format_elapsed(elapsed),
        detail
    )
}

/// Seconds below a minute, minutes above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 60.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}s", secs)
    }
}
