//! Clean-state enforcement before distribution builds.
//!
//! A release wheel must never be assembled from a mix of stale and fresh
//! compiled state, so every configured artifact directory is removed
//! before the backend runs. Any removal failure aborts the build.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::WorkingContext;
use crate::error::BuildError;

/// What a purge removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Paths that existed and were deleted
    pub removed: Vec<PathBuf>,
    /// Paths that were already absent
    pub absent: Vec<PathBuf>,
}

impl CleanReport {
    /// True when nothing had to be deleted.
    pub fn was_clean(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Removes backend-owned artifact state from a working context.
pub trait ArtifactPurger {
    /// Delete all stale artifacts, or fail without the build proceeding.
    fn purge(&self, ctx: &WorkingContext) -> Result<CleanReport, BuildError>;
}

/// Purges a fixed list of directories relative to the package root.
#[derive(Debug, Clone)]
pub struct DirectoryPurger {
    dirs: Vec<PathBuf>,
}

impl DirectoryPurger {
    /// `dirs` are relative to the package root (validated by the settings).
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl ArtifactPurger for DirectoryPurger {
    fn purge(&self, ctx: &WorkingContext) -> Result<CleanReport, BuildError> {
        let mut report = CleanReport::default();

        for dir in &self.dirs {
            let path = ctx.join(dir);

            // symlink_metadata: a symlinked target dir is unlinked, not followed
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "already clean");
                    report.absent.push(path);
                    continue;
                }
                Err(source) => return Err(BuildError::CleanState { path, source }),
            };

            let removal = if metadata.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(source) = removal {
                return Err(BuildError::CleanState { path, source });
            }

            info!(path = %path.display(), "removed stale artifacts");
            report.removed.push(path);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package() -> (TempDir, WorkingContext) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
        let ctx = WorkingContext::open(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_purge_removes_nested_artifacts() {
        let (_dir, ctx) = package();
        let wheels = ctx.join("target/wheels");
        fs::create_dir_all(&wheels).unwrap();
        fs::write(wheels.join("demo-0.1.0-cp312-abi3.whl"), b"zip").unwrap();
        fs::create_dir_all(ctx.join("target/release/build")).unwrap();

        let report = DirectoryPurger::new(vec![PathBuf::from("target")])
            .purge(&ctx)
            .unwrap();

        assert!(!ctx.join("target").exists());
        assert_eq!(report.removed, vec![ctx.join("target")]);
        assert!(!report.was_clean());
    }

    #[test]
    fn test_purge_missing_dir_is_already_clean() {
        let (_dir, ctx) = package();

        let report = DirectoryPurger::new(vec![PathBuf::from("target")])
            .purge(&ctx)
            .unwrap();

        assert!(report.was_clean());
        assert_eq!(report.absent, vec![ctx.join("target")]);
    }

    #[test]
    fn test_purge_leaves_sources_alone() {
        let (_dir, ctx) = package();
        fs::create_dir_all(ctx.join("src")).unwrap();
        fs::write(ctx.join("src/lib.rs"), "").unwrap();
        fs::create_dir_all(ctx.join("target")).unwrap();

        DirectoryPurger::new(vec![PathBuf::from("target")])
            .purge(&ctx)
            .unwrap();

        assert!(ctx.join("src/lib.rs").exists());
        assert!(ctx.join("Cargo.toml").exists());
    }

    #[test]
    fn test_purge_removes_stray_file() {
        let (_dir, ctx) = package();
        fs::write(ctx.join("build"), "leftover").unwrap();

        let report = DirectoryPurger::new(vec![PathBuf::from("build")])
            .purge(&ctx)
            .unwrap();

        assert!(!ctx.join("build").exists());
        assert_eq!(report.removed.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_purge_failure_is_clean_state_error() {
        let (_dir, ctx) = package();
        // `target` is a file, so `target/wheels` cannot even be inspected
        fs::write(ctx.join("target"), "not a directory").unwrap();

        let err = DirectoryPurger::new(vec![PathBuf::from("target/wheels")])
            .purge(&ctx)
            .unwrap_err();

        match err {
            BuildError::CleanState { path, .. } => assert_eq!(path, ctx.join("target/wheels")),
            other => panic!("expected CleanState, got {:?}", other),
        }
        assert!(ctx.join("target").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_purge_stops_at_first_failure() {
        let (_dir, ctx) = package();
        fs::write(ctx.join("target"), "not a directory").unwrap();
        fs::create_dir_all(ctx.join("build")).unwrap();

        let result = DirectoryPurger::new(vec![
            PathBuf::from("target/wheels"),
            PathBuf::from("build"),
        ])
        .purge(&ctx);

        assert!(matches!(result, Err(BuildError::CleanState { .. })));
        assert!(ctx.join("build").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_purge_unlinks_symlink_without_following() {
        let (_dir, ctx) = package();
        let elsewhere = TempDir::new().unwrap();
        fs::write(elsewhere.path().join("keep.txt"), "shared").unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), ctx.join("target")).unwrap();

        DirectoryPurger::new(vec![PathBuf::from("target")])
            .purge(&ctx)
            .unwrap();

        assert!(ctx.join("target").symlink_metadata().is_err());
        assert!(elsewhere.path().join("keep.txt").exists());
    }
}
