//! Preflight checks run before any build step.
//!
//! Validates that the package root and the backend tool are usable BEFORE
//! touching artifacts or starting a long compile.
//!
//! # Checks Performed
//!
//! - **Package root**: contains a manifest the backend can build
//! - **Backend tool**: the backend program resolves on PATH
//! - **Python environment**: development installs need an active
//!   virtualenv or conda environment (warning only)
//!
//! # Usage
//!
//! ```rust,ignore
//! use extbuild::preflight::PreflightChecker;
//!
//! let report = PreflightChecker::new(&ctx, settings.backend.clone()).run_all(mode);
//! report.into_result()?;
//! ```

mod host_tools;
mod python_env;

pub use host_tools::check_backend_tool;
pub use python_env::check_python_env;

use std::ffi::OsString;

use tracing::warn;

use crate::config::WorkingContext;
use crate::error::BuildError;
use crate::mode::BuildMode;

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Passed, but worth pointing out
    pub warning: bool,
    /// Human-readable message
    pub message: String,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            warning: false,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Create a failing check result.
    pub fn fail(
        name: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            warning: false,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a warning check result (passes but with a note).
    pub fn warn(
        name: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: true,
            warning: true,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

/// All preflight results for one run.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Check if all preflight checks passed.
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Get all failing checks.
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    /// Get all passing checks that carry a warning.
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| c.warning).collect()
    }

    /// Log warnings, then fail with every failed check listed.
    pub fn into_result(self) -> Result<(), BuildError> {
        for check in self.warnings() {
            warn!(check = %check.name, "{}", check.message);
        }

        if self.is_ok() {
            return Ok(());
        }

        let msg = self
            .errors()
            .iter()
            .map(|c| match &c.suggestion {
                Some(suggestion) => format!("  {}: {} ({})", c.name, c.message, suggestion),
                None => format!("  {}: {}", c.name, c.message),
            })
            .collect::<Vec<_>>()
            .join("\n");
        Err(BuildError::Environment(format!(
            "preflight checks failed:\n{}",
            msg
        )))
    }
}

/// Preflight checker for one package root and backend.
pub struct PreflightChecker<'a> {
    ctx: &'a WorkingContext,
    backend: OsString,
}

impl<'a> PreflightChecker<'a> {
    pub fn new(ctx: &'a WorkingContext, backend: impl Into<OsString>) -> Self {
        Self {
            ctx,
            backend: backend.into(),
        }
    }

    /// Run every check that applies to `mode`.
    pub fn run_all(&self, mode: BuildMode) -> PreflightReport {
        let mut report = PreflightReport::default();

        report.checks.push(self.check_package_root());
        report.checks.push(check_backend_tool(&self.backend));

        match mode {
            BuildMode::Development => report.checks.push(check_python_env()),
            BuildMode::Distribution => {}
        }

        report
    }

    fn check_package_root(&self) -> CheckResult {
        match self.ctx.manifest() {
            Some(manifest) => CheckResult::pass(
                "Package root",
                format!("{} ({})", self.ctx.root().display(), manifest.display()),
            ),
            None => CheckResult::fail(
                "Package root",
                format!("No package manifest in {}", self.ctx.root().display()),
                "Set EXTBUILD_ROOT to the directory containing pyproject.toml",
            ),
        }
    }
}
