//! Orchestrator settings and the working context.
//!
//! The command line belongs to mode selection, so settings are read from
//! the environment only:
//!
//! | Variable              | Default                                |
//! |-----------------------|----------------------------------------|
//! | `EXTBUILD_ROOT`       | nearest package at or above the cwd    |
//! | `EXTBUILD_BACKEND`    | `maturin`                              |
//! | `EXTBUILD_CLEAN_DIRS` | `target`                               |
//!
//! # Example
//!
//! ```rust
//! use extbuild::config::BuildSettings;
//!
//! let settings = BuildSettings::parse_args(["--backend", "/opt/bin/maturin"]).unwrap();
//! assert_eq!(settings.backend.to_str(), Some("/opt/bin/maturin"));
//! ```

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use clap::Parser;

use crate::error::BuildError;

/// Files that mark a directory as a package the backend can build.
pub const PACKAGE_MANIFESTS: &[&str] = &["pyproject.toml", "Cargo.toml"];

/// Settings resolved once at startup.
#[derive(Debug, Clone, Parser)]
#[command(name = "extbuild", no_binary_name = true)]
pub struct BuildSettings {
    /// Package root all build operations are scoped to
    #[arg(long, env = "EXTBUILD_ROOT")]
    pub root: Option<PathBuf>,

    /// Backend program, by name on PATH or by path
    #[arg(long, env = "EXTBUILD_BACKEND", default_value = "maturin")]
    pub backend: OsString,

    /// Artifact directories purged before a distribution build
    #[arg(
        long,
        env = "EXTBUILD_CLEAN_DIRS",
        value_delimiter = ',',
        default_value = "target"
    )]
    pub clean_dirs: Vec<PathBuf>,
}

impl BuildSettings {
    /// Read settings from the environment.
    pub fn from_env() -> Result<Self, BuildError> {
        Self::parse_args(std::iter::empty::<OsString>())
    }

    /// Parse settings from explicit `--name value` pairs, then the environment.
    pub fn parse_args<I, T>(args: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let settings = Self::try_parse_from(args)
            .map_err(|e| BuildError::Environment(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.backend.is_empty() {
            return Err(BuildError::Environment(
                "backend program must not be empty".into(),
            ));
        }
        for dir in &self.clean_dirs {
            ensure_within_root(dir)?;
        }
        Ok(())
    }
}

/// A clean directory must stay inside the package root.
fn ensure_within_root(dir: &Path) -> Result<(), BuildError> {
    let escapes = dir.as_os_str().is_empty()
        || dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        || dir.components().all(|c| matches!(c, Component::CurDir));

    if escapes {
        return Err(BuildError::Environment(format!(
            "clean directory '{}' must be a relative path below the package root",
            dir.display()
        )));
    }
    Ok(())
}

/// The fixed package root every clean and backend run is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    root: PathBuf,
}

impl WorkingContext {
    /// Resolve the root from settings, falling back to the nearest package
    /// at or above the current directory.
    ///
    /// The result is canonical and is a directory the backend recognizes.
    pub fn resolve(root: Option<&Path>) -> Result<Self, BuildError> {
        match root {
            Some(root) => Self::open(root),
            None => {
                let cwd = std::env::current_dir().map_err(|e| {
                    BuildError::Environment(format!("cannot determine current directory: {}", e))
                })?;
                Self::discover(&cwd)
            }
        }
    }

    /// Walk up from `start` to the first directory holding a package manifest.
    pub fn discover(start: &Path) -> Result<Self, BuildError> {
        let start = start.canonicalize().map_err(|e| {
            BuildError::Environment(format!(
                "directory {} is not accessible: {}",
                start.display(),
                e
            ))
        })?;

        match start.ancestors().find(|dir| manifest_in(dir).is_some()) {
            Some(root) => Self::open(root),
            None => Err(BuildError::Environment(format!(
                "no {} in {} or any parent directory; set EXTBUILD_ROOT",
                PACKAGE_MANIFESTS.join(" or "),
                start.display()
            ))),
        }
    }

    /// Open an explicit package root.
    pub fn open(root: &Path) -> Result<Self, BuildError> {
        let root = root.canonicalize().map_err(|e| {
            BuildError::Environment(format!(
                "package root {} is not accessible: {}",
                root.display(),
                e
            ))
        })?;

        if !root.is_dir() {
            return Err(BuildError::Environment(format!(
                "package root {} is not a directory",
                root.display()
            )));
        }

        if manifest_in(&root).is_none() {
            return Err(BuildError::Environment(format!(
                "package root {} has no {}; the backend cannot build it",
                root.display(),
                PACKAGE_MANIFESTS.join(" or ")
            )));
        }

        Ok(Self { root })
    }

    /// Package root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of something inside the package root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Which manifest file marks this root as a package.
    pub fn manifest(&self) -> Option<PathBuf> {
        manifest_in(&self.root)
    }
}

fn manifest_in(root: &Path) -> Option<PathBuf> {
    PACKAGE_MANIFESTS
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}
