//! Build mode selection.
//!
//! The command line carries at most one meaningful token: `--distribute`.
//! Anything else, including nothing at all, selects a development build.
//! A release build is only ever produced when it was asked for exactly.

use std::ffi::OsString;
use std::fmt;

use tracing::{debug, warn};

/// The only token that selects a distribution build.
pub const DISTRIBUTE_FLAG: &str = "--distribute";

/// Build profile for a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Optimized, installable into the active environment, verbose.
    Development,
    /// Fully optimized release wheel, built from a clean tree.
    Distribution,
}

impl BuildMode {
    /// Arguments passed to the backend program for this mode.
    pub fn backend_args(self) -> &'static [&'static str] {
        match self {
            BuildMode::Development => &["develop", "--release", "-v"],
            BuildMode::Distribution => &["build", "--release"],
        }
    }

    /// Whether stale artifacts must be purged before building.
    pub fn requires_clean_state(self) -> bool {
        match self {
            BuildMode::Development => false,
            BuildMode::Distribution => true,
        }
    }

    /// Short label used in status lines ("Development", "Distribution").
    pub fn label(self) -> &'static str {
        match self {
            BuildMode::Development => "Development",
            BuildMode::Distribution => "Distribution",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildMode::Development => "development",
            BuildMode::Distribution => "distribution",
        })
    }
}

/// Map the invocation arguments (program name already stripped) to a mode.
pub fn select_mode(args: &[OsString]) -> BuildMode {
    let mode = match args {
        [flag] if flag == DISTRIBUTE_FLAG => BuildMode::Distribution,
        _ => BuildMode::Development,
    };

    if mode == BuildMode::Development && !args.is_empty() {
        warn!(
            args = ?args,
            "unrecognized arguments; only '{}' selects a distribution build",
            DISTRIBUTE_FLAG
        );
    }
    debug!(%mode, "build mode selected");

    mode
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<OsString> {
        tokens.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_no_arguments_is_development() {
        assert_eq!(select_mode(&[]), BuildMode::Development);
    }

    #[test]
    fn test_exact_flag_is_distribution() {
        assert_eq!(select_mode(&args(&["--distribute"])), BuildMode::Distribution);
    }

    #[test]
    fn test_near_misses_fall_back_to_development() {
        let near_misses = [
            "-d",
            "--Distribute",
            "--DISTRIBUTE",
            "--distribute=1",
            "distribute",
            "--distribute ",
        ];
        for token in near_misses {
            assert_eq!(
                select_mode(&args(&[token])),
                BuildMode::Development,
                "token {:?} must not select a distribution build",
                token
            );
        }
    }

    #[test]
    fn test_flag_with_extra_arguments_is_development() {
        assert_eq!(
            select_mode(&args(&["--distribute", "--verbose"])),
            BuildMode::Development
        );
        assert_eq!(
            select_mode(&args(&["--distribute", "--distribute"])),
            BuildMode::Development
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_is_development() {
        use std::os::unix::ffi::OsStringExt;

        let invalid = OsString::from_vec(vec![0x2d, 0x2d, 0xff]);
        assert_eq!(select_mode(&[invalid]), BuildMode::Development);
    }

    #[test]
    fn test_backend_args_per_mode() {
        assert_eq!(BuildMode::Development.backend_args(), ["develop", "--release", "-v"]);
        assert_eq!(BuildMode::Distribution.backend_args(), ["build", "--release"]);
    }

    #[test]
    fn test_only_distribution_requires_clean_state() {
        assert!(!BuildMode::Development.requires_clean_state());
        assert!(BuildMode::Distribution.requires_clean_state());
    }
}
