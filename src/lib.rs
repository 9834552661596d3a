//! Build-mode orchestrator for native Python extension packages.
//!
//! Picks a development or distribution build from the command line,
//! purges stale artifacts before distribution builds, runs the backend
//! (maturin by default) inside the package root, and passes its exit
//! status through.
//!
//! # Architecture
//!
//! ```text
//! args ──► mode::select_mode ──► orchestrator::Orchestrator::run
//!                                   │
//!                                   ├── clean::ArtifactPurger    (distribution only)
//!                                   ├── backend::Backend         (exactly once)
//!                                   └── report::report           (message + exit code)
//! ```

pub mod backend;
pub mod clean;
pub mod config;
pub mod error;
pub mod mode;
pub mod orchestrator;
pub mod preflight;
pub mod report;

pub use backend::{Backend, BuildOutcome, ProcessBackend};
pub use clean::{ArtifactPurger, CleanReport, DirectoryPurger};
pub use config::{BuildSettings, WorkingContext};
pub use error::BuildError;
pub use mode::{select_mode, BuildMode, DISTRIBUTE_FLAG};
pub use orchestrator::Orchestrator;
pub use report::Report;

use std::time::{Duration, Instant};

/// Wall-clock timer for a build step.
pub struct Timer {
    label: &'static str,
    started: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// Print and return the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        println!("  [{}] {}", self.label, report::format_elapsed(elapsed));
        elapsed
    }
}
