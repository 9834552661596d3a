//! Backend tool validation.
//!
//! Checks that the backend program is installed and executable.

use std::ffi::OsStr;

use super::CheckResult;

/// Install hint shown when the backend cannot be found.
const INSTALL_HINT: &str = "pip install maturin (or set EXTBUILD_BACKEND)";

/// Check that the backend program resolves to an executable.
///
/// Accepts a bare name (looked up on PATH) or a path.
pub fn check_backend_tool(program: &OsStr) -> CheckResult {
    match which::which(program) {
        Ok(path) => CheckResult::pass("Backend tool", format!("Found at {}", path.display())),
        Err(e) => CheckResult::fail(
            "Backend tool",
            format!("{} not found ({})", program.to_string_lossy(), e),
            INSTALL_HINT,
        ),
    }
}
