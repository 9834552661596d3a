//! Python environment check for development installs.

use std::env;

use super::CheckResult;

/// Variables that mark an active interpreter environment.
const ENV_MARKERS: &[&str] = &["VIRTUAL_ENV", "CONDA_PREFIX"];

/// Warn when no virtualenv or conda environment is active.
///
/// Development builds install into the active environment; without one
/// the backend refuses or installs somewhere unexpected.
pub fn check_python_env() -> CheckResult {
    evaluate(|name| env::var_os(name).filter(|v| !v.is_empty()).map(|_| ()))
}

fn evaluate(lookup: impl Fn(&str) -> Option<()>) -> CheckResult {
    match ENV_MARKERS.iter().find(|name| lookup(name).is_some()) {
        Some(name) => CheckResult::pass("Python environment", format!("Active ({} set)", name)),
        None => CheckResult::warn(
            "Python environment",
            "No virtualenv or conda environment is active",
            "Activate one before a development build, e.g. `source .venv/bin/activate`",
        ),
    }
}
