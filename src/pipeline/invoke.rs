// src/pipeline/invoke.rs

//! Stage invocation as an isolated child process.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::{AppError, Result};
use crate::models::{StageResult, StageSpec};
use crate::storage::RunLog;
use crate::utils;

/// Runs one stage to completion.
///
/// Implementations never fail: a stage that cannot start is reported the same
/// way as one that exits non-zero.
#[async_trait]
pub trait StageInvoker: Send + Sync {
    async fn invoke(&self, stage: &StageSpec, working_dir: &Path, run_log: &RunLog) -> StageResult;
}

/// Launches stages with `tokio::process`, sending combined output to the run log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }

    /// Build the child command with stdout and stderr sharing one log handle.
    fn command(stage: &StageSpec, working_dir: &Path, run_log: &RunLog) -> Command {
        let mut cmd = Command::new(utils::resolve_program(stage.program(), working_dir));
        cmd.args(stage.arguments())
            .envs(stage.env())
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Own process group, so the watchdog can reach everything the stage spawns.
        #[cfg(unix)]
        cmd.process_group(0);

        match Self::output_handles(run_log) {
            Ok((out, err)) => {
                cmd.stdout(out).stderr(err);
            }
            Err(e) => {
                log::warn!("{e}; output of {} goes to the console", stage.name());
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }

        cmd
    }

    fn output_handles(run_log: &RunLog) -> Result<(Stdio, Stdio)> {
        let out = run_log.output_sink()?;
        let err = out
            .try_clone()
            .map_err(|e| AppError::log(run_log.path(), e))?;
        Ok((Stdio::from(out), Stdio::from(err)))
    }

    /// Kill the stage's whole process group, then the leader, and reap it.
    ///
    /// The group is signalled before the leader is reaped, so its id cannot
    /// have been recycled yet.
    async fn terminate(child: &mut Child) -> io::Result<()> {
        let group = kill_process_group(child);
        let leader = child.kill().await;
        group.and(leader)
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child) -> io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pgid = i32::try_from(pid).map_err(io::Error::other)?;
    killpg(Pid::from_raw(pgid), Signal::SIGKILL).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) -> io::Result<()> {
    Ok(())
}

#[async_trait]
impl StageInvoker for ProcessInvoker {
    async fn invoke(&self, stage: &StageSpec, working_dir: &Path, run_log: &RunLog) -> StageResult {
        let started = Instant::now();
        log::debug!("Launching {}: {}", stage.name(), stage);

        let mut child = match Self::command(stage, working_dir, run_log).spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = AppError::launch(stage.name(), e);
                log::error!("{err}");
                run_log.record(&format!("ERROR: {err}"));
                return StageResult::failure(stage.name(), None, started.elapsed());
            }
        };

        let status = match stage.timeout_duration() {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        if let Err(e) = Self::terminate(&mut child).await {
                            log::warn!("Could not kill {}: {e}", stage.name());
                        }
                        let message = format!(
                            "ERROR: {} timed out after {:?} and was killed.",
                            stage.name(),
                            limit
                        );
                        log::error!("{message}");
                        run_log.record(&message);
                        return StageResult::failure(stage.name(), None, started.elapsed());
                    }
                }
            }
            None => child.wait().await,
        };

        match status {
            Ok(status) if status.success() => StageResult::success(stage.name(), started.elapsed()),
            Ok(status) => {
                log::debug!("{} exited with {status}", stage.name());
                StageResult::failure(stage.name(), status.code(), started.elapsed())
            }
            Err(e) => {
                log::error!("Waiting on {} failed: {e}", stage.name());
                StageResult::failure(stage.name(), None, started.elapsed())
            }
        }
    }
}
