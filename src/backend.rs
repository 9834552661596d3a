//! Backend invocation.
//!
//! The backend (maturin by default) does all compilation and packaging.
//! The orchestrator runs it once per invocation inside the package root,
//! lets its output stream straight to the terminal, and looks only at the
//! exit status.
//!
//! The backend runs in its own process group. If the orchestrator is
//! interrupted while the backend runs, the whole group (backend, cargo,
//! rustc) is killed and the backend reaped before returning, so no build
//! keeps running in the background.

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::WorkingContext;
use crate::error::BuildError;
use crate::mode::BuildMode;

/// Terminal state of one backend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    success: bool,
    code: i32,
}

impl BuildOutcome {
    /// Outcome from a raw exit code.
    pub fn from_code(code: i32) -> Self {
        Self {
            success: code == 0,
            code,
        }
    }

    /// Outcome from a finished process.
    ///
    /// A process killed by a signal reports `128 + signal`, the way shells do.
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::from_code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::from_code(128 + signal);
            }
        }

        Self::from_code(crate::error::EXIT_FAILURE)
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// The backend's own exit status.
    pub fn code(&self) -> i32 {
        self.code
    }
}

/// External build backend.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Run one build to completion inside `ctx`.
    async fn invoke(
        &self,
        mode: BuildMode,
        ctx: &WorkingContext,
    ) -> Result<BuildOutcome, BuildError>;
}

/// Runs the backend as a child process.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: OsString,
}

impl ProcessBackend {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program name or path this backend runs.
    pub fn program(&self) -> &std::ffi::OsStr {
        &self.program
    }

    /// Human-readable command line for a mode.
    pub fn command_line(&self, mode: BuildMode) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in mode.backend_args() {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl Backend for ProcessBackend {
    async fn invoke(
        &self,
        mode: BuildMode,
        ctx: &WorkingContext,
    ) -> Result<BuildOutcome, BuildError> {
        info!(command = %self.command_line(mode), root = %ctx.root().display(), "invoking backend");

        // listeners go in before spawn so an early signal is never missed
        let mut shutdown = match ShutdownSignal::install() {
            Ok(shutdown) => Some(shutdown),
            Err(e) => {
                warn!(error = %e, "cannot listen for interrupts; backend runs unguarded");
                None
            }
        };

        let mut command = Command::new(&self.program);
        command
            .args(mode.backend_args())
            .current_dir(ctx.root())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            BuildError::Environment(format!(
                "failed to start backend '{}': {}",
                self.program.to_string_lossy(),
                e
            ))
        })?;
        let mut group = ProcessGroup::of(&child);

        debug!(pid = ?child.id(), "backend started");

        let status = match shutdown.as_mut() {
            Some(shutdown) => tokio::select! {
                status = child.wait() => status,
                signal = shutdown.recv() => {
                    warn!(signal, "interrupted; stopping backend");
                    group.kill();
                    if let Err(e) = child.wait().await {
                        warn!(error = %e, "failed to reap backend");
                    }
                    return Err(BuildError::Interrupted { signal });
                }
            },
            None => child.wait().await,
        };
        group.disarm();

        let status = status
            .map_err(|e| BuildError::Environment(format!("failed to wait for backend: {}", e)))?;

        let outcome = BuildOutcome::from_status(status);
        debug!(code = outcome.code(), success = outcome.success(), "backend finished");
        Ok(outcome)
    }
}

/// The backend's process group: the backend plus everything it spawned
/// (cargo, rustc, linkers).
///
/// Killed as a whole on interrupt, and on drop unless the backend exited
/// on its own first.
struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|id| i32::try_from(id).ok()),
        }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "failed to kill backend process group"),
    }
}

// Without process groups only the direct child is stopped, by kill_on_drop.
#[cfg(not(unix))]
fn kill_group(_pgid: i32) {}

/// Interrupt listeners, registered up front.
struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignal {
    fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(windows)]
        {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c()?,
            })
        }
    }

    /// Resolves with the signal name when the process is asked to stop.
    async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.terminate.recv() => "SIGTERM",
            }
        }

        #[cfg(windows)]
        {
            self.ctrl_c.recv().await;
            "Ctrl-C"
        }
    }
}
