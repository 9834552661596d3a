//! The build pipeline.
//!
//! ```text
//! Start → ModeSelected ─┬─ Development ──────────────┬→ Invoking → Reported
//!                       └─ Distribution → Cleaning ──┘
//! ```
//!
//! Strictly sequential: the purge finishes before the backend starts and
//! the backend finishes before anything is reported. Nothing is retried.

use std::fmt;
use std::time::Instant;

use tracing::debug;

use crate::backend::Backend;
use crate::clean::ArtifactPurger;
use crate::config::WorkingContext;
use crate::error::BuildError;
use crate::mode::BuildMode;
use crate::report::{report, Report};
use crate::Timer;

/// Pipeline position, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ModeSelected(BuildMode),
    Cleaning,
    Invoking(BuildMode),
    Reported { success: bool },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ModeSelected(mode) => write!(f, "mode-selected({})", mode),
            Stage::Cleaning => f.write_str("cleaning"),
            Stage::Invoking(mode) => write!(f, "invoking({})", mode),
            Stage::Reported { success: true } => f.write_str("reported(success)"),
            Stage::Reported { success: false } => f.write_str("reported(failure)"),
        }
    }
}

/// Runs one build in a fixed working context.
pub struct Orchestrator<B, P> {
    ctx: WorkingContext,
    backend: B,
    purger: P,
}

impl<B: Backend, P: ArtifactPurger> Orchestrator<B, P> {
    pub fn new(ctx: WorkingContext, backend: B, purger: P) -> Self {
        Self {
            ctx,
            backend,
            purger,
        }
    }

    /// Run the pipeline for `mode`.
    ///
    /// `Err` means the run aborted before the backend produced an outcome
    /// (failed purge, unusable backend, interruption). A backend that ran
    /// and failed is reported through `Ok(Report)` with its own status.
    pub async fn run(&self, mode: BuildMode) -> Result<Report, BuildError> {
        enter(Stage::ModeSelected(mode));
        let started = Instant::now();

        if mode.requires_clean_state() {
            enter(Stage::Cleaning);
            println!("Cleaning stale build artifacts...");
            let t = Timer::start("Clean");
            let cleaned = self.purger.purge(&self.ctx)?;
            t.finish();
            if cleaned.was_clean() {
                println!("  [SKIP] Nothing to clean");
            } else {
                for path in &cleaned.removed {
                    println!("  Removed {}", path.display());
                }
            }
        }

        enter(Stage::Invoking(mode));
        println!("\nRunning {} build...", mode);
        let t = Timer::start("Backend");
        let outcome = self.backend.invoke(mode, &self.ctx).await?;
        t.finish();

        enter(Stage::Reported {
            success: outcome.success(),
        });
        Ok(report(mode, outcome, started.elapsed()))
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "pipeline stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BuildOutcome;
    use crate::clean::CleanReport;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeBackend {
        log: Log,
        code: i32,
    }

    impl Backend for FakeBackend {
        async fn invoke(
            &self,
            mode: BuildMode,
            _ctx: &WorkingContext,
        ) -> Result<BuildOutcome, BuildError> {
            self.log.lock().unwrap().push(format!("invoke:{}", mode));
            Ok(BuildOutcome::from_code(self.code))
        }
    }

    struct FakePurger {
        log: Log,
        fail: bool,
    }

    impl ArtifactPurger for FakePurger {
        fn purge(&self, ctx: &WorkingContext) -> Result<CleanReport, BuildError> {
            self.log.lock().unwrap().push("purge".to_string());
            if self.fail {
                return Err(BuildError::CleanState {
                    path: ctx.join("target"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            Ok(CleanReport::default())
        }
    }

    type Harness = (TempDir, Log, Orchestrator<FakeBackend, FakePurger>);

    fn harness(code: i32, purge_fails: bool) -> Harness {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        let ctx = WorkingContext::open(dir.path()).unwrap();
        let log: Log = Arc::default();
        let orchestrator = Orchestrator::new(
            ctx,
            FakeBackend {
                log: log.clone(),
                code,
            },
            FakePurger {
                log: log.clone(),
                fail: purge_fails,
            },
        );
        (dir, log, orchestrator)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_development_success_never_cleans() {
        let (_dir, log, orchestrator) = harness(0, false);

        let report = orchestrator.run(BuildMode::Development).await.unwrap();

        assert_eq!(entries(&log), ["invoke:development"]);
        assert_eq!(report.exit_code, 0);
        assert!(report.message.unwrap().contains("Development Build Complete"));
    }

    #[tokio::test]
    async fn test_distribution_cleans_once_before_invoke() {
        let (_dir, log, orchestrator) = harness(0, false);

        let report = orchestrator.run(BuildMode::Distribution).await.unwrap();

        assert_eq!(entries(&log), ["purge", "invoke:distribution"]);
        assert_eq!(report.exit_code, 0);
        assert!(report.message.unwrap().contains("Distribution Build Complete"));
    }

    #[tokio::test]
    async fn test_distribution_backend_failure_mirrors_status() {
        let (_dir, log, orchestrator) = harness(1, false);

        let report = orchestrator.run(BuildMode::Distribution).await.unwrap();

        assert_eq!(entries(&log), ["purge", "invoke:distribution"]);
        assert_eq!(report.exit_code, 1);
        assert!(report.message.is_none());
    }

    #[tokio::test]
    async fn test_failed_clean_never_invokes_backend() {
        let (_dir, log, orchestrator) = harness(0, true);

        let err = orchestrator.run(BuildMode::Distribution).await.unwrap_err();

        assert_eq!(entries(&log), ["purge"]);
        assert!(matches!(err, BuildError::CleanState { .. }));
        assert_ne!(err.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_repeated_development_runs_classify_identically() {
        for code in [0, 2] {
            let (_dir, _log, orchestrator) = harness(code, false);
            let first = orchestrator.run(BuildMode::Development).await.unwrap();
            let second = orchestrator.run(BuildMode::Development).await.unwrap();
            assert_eq!(first.exit_code, second.exit_code);
            assert_eq!(first.message.is_some(), second.message.is_some());
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Cleaning.to_string(), "cleaning");
        assert_eq!(
            Stage::Invoking(BuildMode::Distribution).to_string(),
            "invoking(distribution)"
        );
        assert_eq!(
            Stage::Reported { success: false }.to_string(),
            "reported(failure)"
        );
    }
}
