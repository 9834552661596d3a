//! extbuild CLI
//!
//! Builds a native Python extension package through maturin.
//!
//! # Usage
//!
//! ```bash
//! # Development build, installed into the active virtualenv
//! extbuild
//!
//! # Clean release build producing a wheel
//! extbuild --distribute
//! ```
//!
//! Any other argument falls back to a development build. Settings come
//! from `EXTBUILD_ROOT`, `EXTBUILD_BACKEND` and `EXTBUILD_CLEAN_DIRS`;
//! diagnostics are controlled with `RUST_LOG`.

use std::ffi::OsString;

use anyhow::{Context, Result};
use extbuild::preflight::PreflightChecker;
use extbuild::{
    select_mode, BuildError, BuildMode, BuildSettings, DirectoryPurger, Orchestrator,
    ProcessBackend, Report, WorkingContext,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let mode = select_mode(&args);

    let code = match run(mode).await {
        Ok(report) => {
            if let Some(message) = &report.message {
                println!("\n{}", message);
            }
            report.exit_code
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<BuildError>()
                .map_or(extbuild::error::EXIT_FAILURE, BuildError::exit_code)
        }
    };

    std::process::exit(code);
}

async fn run(mode: BuildMode) -> Result<Report> {
    let settings = BuildSettings::from_env().context("reading EXTBUILD_* settings")?;
    let ctx = WorkingContext::resolve(settings.root.as_deref())
        .context("resolving package root")?;

    println!("=== {} Build: {} ===\n", mode.label(), ctx.root().display());

    PreflightChecker::new(&ctx, settings.backend.clone())
        .run_all(mode)
        .into_result()
        .context("preflight")?;

    let orchestrator = Orchestrator::new(
        ctx,
        ProcessBackend::new(settings.backend),
        DirectoryPurger::new(settings.clean_dirs),
    );

    orchestrator
        .run(mode)
        .await
        .with_context(|| format!("{} build aborted", mode))
}
